//! # BAZAAR Client - The Optimistic Shop
//!
//! Client-side shop economy for an auto-battler: purchases, rerolls and
//! experience feel instant while the server stays the only source of truth.
//!
//! ## Architecture
//!
//! ```text
//! click ─▶ ActionDispatcher ─▶ CommandSink ─────────▶ server
//!               │ Δ gold, pending slot                  │
//!               ▼                                       ▼
//!        PendingActionSet ◀── ReconciliationEngine ◀── snapshot
//!                                   │
//!                                   ▼
//!                      DisplayedEconomyState (render)
//! ```
//!
//! - **Dispatch**: record an optimistic adjustment, send the command
//! - **Reconciliation**: every applied snapshot replaces the state wholesale
//!   and clears the numeric deltas; purchases are resolved slot by slot
//! - **Transition**: a reroll collapses the shop until the new one arrives
//!
//! ## Trust Model
//!
//! The client NEVER rolls back. A wrong guess is overwritten by the next
//! snapshot, and a stale snapshot (tick at or below the last applied) is
//! discarded.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bazaar_client::{ShopConfig, ShopSession, StaticSession};
//!
//! let config = ShopConfig::load("config/shop.toml")?;
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let mut shop = ShopSession::new(&config, tx, StaticSession::in_game(1));
//!
//! shop.handle_frame(&frame);
//! shop.request_purchase(2)?;
//! let shown = shop.displayed();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod animation;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod integration;
pub mod notice;
pub mod pending;
pub mod reconciliation;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod transition;

// Re-exports for convenience
pub use animation::{Animation, Easing};
pub use config::{NoticeConfig, ShopConfig, TransitionConfig, UnaffordablePolicy};
pub use dispatcher::{ActionDispatcher, DispatchOutcome};
pub use error::{ConfigError, ConfigResult, DispatchError, DispatchResult, TransportError};
pub use integration::{
    CommandSink, RecordingSink, SessionSource, StaticCatalog, StaticSession, UnitCatalog,
    UnitTemplate,
};
pub use notice::{NoticeId, NoticeQueue, NoticeView};
pub use pending::{PendingActionSet, PendingPurchase, PurchaseAck, PurchaseId, SlotResolution};
pub use reconciliation::{
    DisplayedEconomyState, ReconciliationEngine, ReconciliationReport, SnapshotOutcome,
};
pub use session::ShopSession;
pub use simulation::{
    LatencyLink, LinkConditions, ServerRules, ShopSimulation, SimulatedShopServer,
    SimulationConfig, SimulationStats,
};
pub use snapshot::{Admission, AuthoritativeSnapshot, IngestStats, SnapshotGate};
pub use transition::{RerollTransitionCoordinator, TransitionEvent, TransitionState};

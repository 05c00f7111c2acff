//! # Collaborator Interfaces
//!
//! The shop core talks to three things it does not own:
//!
//! - **Networking**: carries commands out ([`CommandSink`])
//! - **Session**: knows whether we are in a game ([`SessionSource`])
//! - **Catalog**: knows what a unit is ([`UnitCatalog`], presentation only)
//!
//! ```text
//! ShopSession ──ShopCommand──▶ CommandSink ──▶ network
//!      ▲                                          │
//!      └────────── ServerMessage frames ◀─────────┘
//! ```
//!
//! Each trait ships with an in-memory implementation for tests and tools.

pub mod traits;

pub use traits::*;

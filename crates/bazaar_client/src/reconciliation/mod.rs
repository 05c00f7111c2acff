//! # Reconciliation Engine
//!
//! The single answer to "what does the shop look like right now".
//!
//! ## How It Works
//!
//! 1. Dispatcher records an optimistic adjustment and sends the command
//! 2. Presentation immediately renders snapshot + ledger
//! 3. Server pushes a snapshot reflecting every command it had received
//! 4. Engine replaces the snapshot, drops the numeric deltas, resolves slots
//!
//! ```text
//! Snapshot:   gold 10 ───────────────────── gold 6
//!                │                              │
//! Ledger:        └─ buy(2) -4 ── slot 2 hidden ─┴─ Δ cleared, slot 2 confirmed
//!                │                              │
//! Displayed:  10 ┴ 6 ────────────────────────── 6
//! ```
//!
//! After any applied snapshot the displayed gold and free rerolls equal the
//! server's exactly. Only slot emptiness may stay optimistic, and for at
//! most `stale_slot_allowance + 1` snapshots.

use bazaar_shared::{RoundPhase, ShopOffer, Tick};

use crate::config::ShopConfig;
use crate::pending::{PendingActionSet, SlotResolution};
use crate::snapshot::{Admission, AuthoritativeSnapshot, IngestStats, SnapshotGate};

/// What the presentation layer renders. Always derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayedEconomyState {
    /// Tick of the underlying snapshot.
    pub tick: Tick,
    /// Gold to render, clamped at zero.
    pub gold: u32,
    /// Snapshot gold plus the optimistic delta. May be negative.
    pub unclamped_gold: i64,
    /// Free rerolls to render, clamped at zero.
    pub free_rerolls: u32,
    /// Shop slots, with pending purchases shown empty.
    pub shop_slots: Vec<Option<ShopOffer>>,
    /// Slots hidden because their purchase is in flight.
    pub pending_slots: Vec<usize>,
    /// Lock state, straight from the snapshot.
    pub shop_locked: bool,
    /// Player level.
    pub level: u32,
    /// Player health.
    pub health: u32,
    /// Round number.
    pub round: u32,
    /// Round phase.
    pub phase: RoundPhase,
}

/// Whether an offered snapshot was used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Replaced the stored snapshot.
    Applied,
    /// Older than or equal to the stored snapshot; dropped.
    Discarded {
        /// Tick of the stored snapshot.
        last_tick: Tick,
    },
}

/// Everything one snapshot changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Tick of the offered snapshot.
    pub tick: Tick,
    /// Applied or discarded.
    pub outcome: SnapshotOutcome,
    /// Gold delta that became redundant.
    pub dropped_gold_delta: i64,
    /// Free-reroll delta that became redundant.
    pub dropped_free_reroll_delta: i64,
    /// Slots whose purchase was observed to complete.
    pub confirmed_slots: Vec<usize>,
    /// Slots shown again (rejected, presumed rejected, or superseded).
    pub healed_slots: Vec<usize>,
    /// Purchases still in flight.
    pub still_pending: usize,
}

impl ReconciliationReport {
    fn discarded(tick: Tick, last_tick: Tick, still_pending: usize) -> Self {
        Self {
            tick,
            outcome: SnapshotOutcome::Discarded { last_tick },
            dropped_gold_delta: 0,
            dropped_free_reroll_delta: 0,
            confirmed_slots: Vec::new(),
            healed_slots: Vec::new(),
            still_pending,
        }
    }

    /// True if the snapshot was applied.
    #[must_use]
    pub fn applied(&self) -> bool {
        self.outcome == SnapshotOutcome::Applied
    }
}

/// Merges the authoritative snapshot with the pending ledger.
#[derive(Clone, Debug)]
pub struct ReconciliationEngine {
    snapshot: Option<AuthoritativeSnapshot>,
    pending: PendingActionSet,
    gate: SnapshotGate,
    stale_slot_allowance: u32,
}

impl ReconciliationEngine {
    /// Creates an engine with no snapshot yet.
    #[must_use]
    pub fn new(stale_slot_allowance: u32) -> Self {
        Self {
            snapshot: None,
            pending: PendingActionSet::new(),
            gate: SnapshotGate::new(),
            stale_slot_allowance,
        }
    }

    /// Creates an engine from config.
    #[must_use]
    pub fn from_config(config: &ShopConfig) -> Self {
        Self::new(config.stale_slot_allowance)
    }

    /// Ingests a server push.
    ///
    /// Stale snapshots are discarded wholesale. An applied snapshot replaces
    /// the stored one, clears the numeric deltas and resolves purchases.
    pub fn on_snapshot_received(
        &mut self,
        snapshot: impl Into<AuthoritativeSnapshot>,
    ) -> ReconciliationReport {
        let snapshot = snapshot.into();
        let tick = snapshot.tick();

        if let Admission::Stale { last_tick } = self.gate.admit(tick) {
            tracing::warn!(tick, last_tick, "stale snapshot discarded");
            return ReconciliationReport::discarded(tick, last_tick, self.pending.purchases().len());
        }

        let (dropped_gold_delta, dropped_free_reroll_delta) = self.pending.clear_deltas();

        let mut confirmed_slots = Vec::new();
        let mut healed_slots = Vec::new();
        for (slot, resolution) in self
            .pending
            .resolve_purchases(&snapshot, self.stale_slot_allowance)
        {
            match resolution {
                SlotResolution::Confirmed => {
                    tracing::debug!(slot, tick, "purchase confirmed");
                    confirmed_slots.push(slot);
                }
                SlotResolution::Superseded | SlotResolution::Healed => {
                    tracing::debug!(slot, tick, ?resolution, "pending slot released");
                    healed_slots.push(slot);
                }
                SlotResolution::Pending => {}
            }
        }

        tracing::debug!(
            tick,
            gold = snapshot.gold(),
            dropped_gold_delta,
            pending = self.pending.purchases().len(),
            "snapshot applied"
        );
        self.snapshot = Some(snapshot);

        ReconciliationReport {
            tick,
            outcome: SnapshotOutcome::Applied,
            dropped_gold_delta,
            dropped_free_reroll_delta,
            confirmed_slots,
            healed_slots,
            still_pending: self.pending.purchases().len(),
        }
    }

    /// Applies a `BuyUnit` acknowledgement to the pending purchases.
    pub fn acknowledge_purchase(&mut self, success: bool) -> Option<usize> {
        self.pending.acknowledge_purchase(success)
    }

    /// The current displayed state, or `None` before the first snapshot.
    #[must_use]
    pub fn displayed(&self) -> Option<DisplayedEconomyState> {
        let snapshot = self.snapshot.as_ref()?;
        let unclamped_gold = self.displayed_gold()?;
        let free_rerolls = self.displayed_free_rerolls()?;
        let shop_slots = (0..snapshot.shop_slots().len())
            .map(|slot| self.displayed_slot(slot))
            .collect();

        Some(DisplayedEconomyState {
            tick: snapshot.tick(),
            gold: clamp_to_u32(unclamped_gold),
            unclamped_gold,
            free_rerolls: clamp_to_u32(free_rerolls),
            shop_slots,
            pending_slots: self.pending.pending_slots().collect(),
            shop_locked: snapshot.shop_locked(),
            level: snapshot.level(),
            health: snapshot.health(),
            round: snapshot.round(),
            phase: snapshot.phase(),
        })
    }

    /// Snapshot gold plus the optimistic delta, unclamped.
    #[must_use]
    pub fn displayed_gold(&self) -> Option<i64> {
        let snapshot = self.snapshot.as_ref()?;
        Some(i64::from(snapshot.gold()) + self.pending.gold_delta())
    }

    /// Snapshot free rerolls plus the optimistic delta, unclamped.
    #[must_use]
    pub fn displayed_free_rerolls(&self) -> Option<i64> {
        let snapshot = self.snapshot.as_ref()?;
        Some(i64::from(snapshot.free_rerolls()) + self.pending.free_reroll_delta())
    }

    /// Offer shown in `slot`; `None` if empty, pending or out of range.
    #[must_use]
    pub fn displayed_slot(&self, slot: usize) -> Option<ShopOffer> {
        if self.pending.is_slot_pending(slot) {
            return None;
        }
        self.snapshot.as_ref()?.slot(slot)
    }

    /// The stored snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&AuthoritativeSnapshot> {
        self.snapshot.as_ref()
    }

    /// The pending ledger.
    #[must_use]
    pub fn pending(&self) -> &PendingActionSet {
        &self.pending
    }

    /// Mutable ledger access for the dispatcher.
    pub(crate) fn pending_mut(&mut self) -> &mut PendingActionSet {
        &mut self.pending
    }

    /// Snapshot admission counters.
    #[must_use]
    pub fn ingest_stats(&self) -> IngestStats {
        self.gate.stats()
    }

    /// Clears the ledger only. The stored snapshot stays visible.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Forgets everything: snapshot, ledger and tick ordering.
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.pending.clear();
        self.gate.reset();
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

//! # Pending Action Ledger
//!
//! What the client has spent but the server has not yet shown.
//!
//! ```text
//! Dispatch:   buy(2) -4g   reroll -2g   buy(0) -3g
//!                 │            │            │
//! Ledger:     gold Δ = -9, slots = {2, 0}
//!                 │
//! Snapshot:   gold Δ cleared in bulk, slots resolved one by one
//! ```
//!
//! Gold and free-reroll adjustments are cumulative integers. Purchases are
//! tracked per slot because a stale snapshot must not un-hide a slot that
//! was just bought.

use std::collections::VecDeque;

use bazaar_shared::{ShopOffer, UnitId};

use crate::snapshot::AuthoritativeSnapshot;

/// Server acknowledgement state of one purchase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PurchaseAck {
    /// No `ActionResult` seen yet.
    #[default]
    Unacknowledged,
    /// Server reported success.
    Accepted,
    /// Server reported failure.
    Rejected,
}

/// How a pending purchase was settled by a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotResolution {
    /// Slot observed empty: the purchase went through.
    Confirmed,
    /// Slot holds a different unit: the shop moved on past the purchase.
    Superseded,
    /// Slot is still filled and the purchase is known or presumed rejected.
    Healed,
    /// Slot is still filled by a snapshot that may predate the purchase.
    Pending,
}

/// Identifies one recorded purchase across its ledger lifetime.
pub type PurchaseId = u64;

/// One in-flight purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPurchase {
    /// Ledger-local id, matched against acknowledgements.
    pub id: PurchaseId,
    /// Shop slot.
    pub slot: usize,
    /// Unit that was in the slot when the purchase was sent.
    pub unit_id: UnitId,
    /// Gold charged optimistically.
    pub cost: u32,
    /// Acknowledgement state.
    pub ack: PurchaseAck,
    /// Consecutive snapshots that still showed the unit.
    pub stale_observations: u32,
}

impl PendingPurchase {
    /// Classifies this purchase against what a snapshot shows in its slot.
    fn observe(&mut self, observed: Option<ShopOffer>, allowance: u32) -> SlotResolution {
        let Some(offer) = observed else {
            return SlotResolution::Confirmed;
        };
        if offer.unit_id != self.unit_id {
            return SlotResolution::Superseded;
        }
        if self.ack == PurchaseAck::Rejected {
            return SlotResolution::Healed;
        }
        self.stale_observations += 1;
        if self.stale_observations > allowance {
            SlotResolution::Healed
        } else {
            SlotResolution::Pending
        }
    }
}

/// Ledger of optimistic adjustments awaiting a snapshot.
#[derive(Clone, Debug, Default)]
pub struct PendingActionSet {
    /// Sum of unconfirmed spends (negative) and refunds.
    gold_delta: i64,
    /// Signed adjustment to free rerolls.
    free_reroll_delta: i64,
    /// In-flight purchases, oldest first.
    purchases: Vec<PendingPurchase>,
    /// One entry per `BuyUnit` sent and not yet answered, in send order.
    /// `None` marks a purchase sent without a ledger entry.
    unanswered: VecDeque<Option<PurchaseId>>,
    next_id: PurchaseId,
}

impl PendingActionSet {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gold_delta: 0,
            free_reroll_delta: 0,
            purchases: Vec::new(),
            unanswered: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Optimistic gold delta.
    #[inline]
    #[must_use]
    pub const fn gold_delta(&self) -> i64 {
        self.gold_delta
    }

    /// Optimistic free-reroll delta.
    #[inline]
    #[must_use]
    pub const fn free_reroll_delta(&self) -> i64 {
        self.free_reroll_delta
    }

    /// Records a gold spend.
    pub fn record_gold_spend(&mut self, amount: u32) {
        self.gold_delta -= i64::from(amount);
    }

    /// Records consumption of one free reroll.
    pub fn record_free_reroll(&mut self) {
        self.free_reroll_delta -= 1;
    }

    /// Records a purchase: charges its cost and hides its slot.
    ///
    /// The slot must not already be pending.
    pub fn record_purchase(&mut self, slot: usize, offer: ShopOffer) {
        debug_assert!(!self.is_slot_pending(slot), "slot {slot} already pending");
        self.record_gold_spend(offer.cost);
        let id = self.next_id;
        self.next_id += 1;
        self.unanswered.push_back(Some(id));
        self.purchases.push(PendingPurchase {
            id,
            slot,
            unit_id: offer.unit_id,
            cost: offer.cost,
            ack: PurchaseAck::Unacknowledged,
            stale_observations: 0,
        });
    }

    /// Records a `BuyUnit` sent with no optimistic effect, so its
    /// acknowledgement is not credited to another purchase.
    pub fn record_forwarded_purchase(&mut self) {
        self.unanswered.push_back(None);
    }

    /// `BuyUnit` commands still waiting for an acknowledgement.
    #[must_use]
    pub fn unanswered_purchases(&self) -> usize {
        self.unanswered.len()
    }

    /// Whether a purchase of `slot` is in flight.
    #[must_use]
    pub fn is_slot_pending(&self, slot: usize) -> bool {
        self.purchases.iter().any(|p| p.slot == slot)
    }

    /// Slots with a purchase in flight, oldest first.
    pub fn pending_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.purchases.iter().map(|p| p.slot)
    }

    /// In-flight purchases, oldest first.
    #[must_use]
    pub fn purchases(&self) -> &[PendingPurchase] {
        &self.purchases
    }

    /// True when nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gold_delta == 0 && self.free_reroll_delta == 0 && self.purchases.is_empty()
    }

    /// Applies a `BuyUnit` acknowledgement to the oldest unanswered
    /// `BuyUnit`. Returns the slot if that purchase is still in the ledger.
    ///
    /// The server answers one client's commands in send order. An
    /// acknowledgement for a forwarded or already settled purchase is
    /// consumed without touching any other purchase.
    pub fn acknowledge_purchase(&mut self, success: bool) -> Option<usize> {
        let id = self.unanswered.pop_front()??;
        let purchase = self.purchases.iter_mut().find(|p| p.id == id)?;
        purchase.ack = if success {
            PurchaseAck::Accepted
        } else {
            PurchaseAck::Rejected
        };
        Some(purchase.slot)
    }

    /// Zeroes both numeric deltas, returning what was dropped.
    pub fn clear_deltas(&mut self) -> (i64, i64) {
        let dropped = (self.gold_delta, self.free_reroll_delta);
        self.gold_delta = 0;
        self.free_reroll_delta = 0;
        dropped
    }

    /// Resolves every pending purchase against `snapshot`, removing the
    /// settled ones. Returns the resolution of each purchase, in order.
    pub fn resolve_purchases(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        allowance: u32,
    ) -> Vec<(usize, SlotResolution)> {
        let mut resolutions = Vec::with_capacity(self.purchases.len());
        self.purchases.retain_mut(|purchase| {
            let resolution = purchase.observe(snapshot.slot(purchase.slot), allowance);
            resolutions.push((purchase.slot, resolution));
            resolution == SlotResolution::Pending
        });
        resolutions
    }

    /// Drops everything, including unanswered purchases.
    pub fn clear(&mut self) {
        self.gold_delta = 0;
        self.free_reroll_delta = 0;
        self.purchases.clear();
        self.unanswered.clear();
    }
}

//! # Snapshot Ingestion
//!
//! The server pushes full economic state; the client never merges, it
//! replaces. This module holds the immutable snapshot value and the gate
//! that refuses anything older than what is already applied.
//!
//! ```text
//! Server Ticks:   [10] [11] [12]
//!                   │    │    │
//! Network:          ~~~~~~~~~~~~~ (12 overtakes 11)
//!                   │    │    │
//! Client:         [10] [12] [11] ← discarded, would resurrect spent gold
//! ```

use bazaar_shared::{RoundPhase, ShopOffer, SnapshotMessage, Tick};

/// Read-only copy of the server's economic state as of one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthoritativeSnapshot {
    inner: SnapshotMessage,
}

impl AuthoritativeSnapshot {
    /// Wraps a decoded snapshot message.
    #[must_use]
    pub fn new(message: SnapshotMessage) -> Self {
        Self { inner: message }
    }

    /// Server tick the snapshot was generated at.
    #[inline]
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.inner.tick
    }

    /// Authoritative gold.
    #[inline]
    #[must_use]
    pub fn gold(&self) -> u32 {
        self.inner.gold
    }

    /// Authoritative free rerolls.
    #[inline]
    #[must_use]
    pub fn free_rerolls(&self) -> u32 {
        self.inner.free_rerolls
    }

    /// All shop slots.
    #[inline]
    #[must_use]
    pub fn shop_slots(&self) -> &[Option<ShopOffer>] {
        &self.inner.shop_slots
    }

    /// Offer in `slot`; `None` when empty or out of range.
    #[inline]
    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<ShopOffer> {
        self.inner.shop_slots.get(slot).copied().flatten()
    }

    /// Whether the shop is locked.
    #[inline]
    #[must_use]
    pub fn shop_locked(&self) -> bool {
        self.inner.shop_locked
    }

    /// Player level.
    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.inner.level
    }

    /// Player health.
    #[inline]
    #[must_use]
    pub fn health(&self) -> u32 {
        self.inner.health
    }

    /// Round number.
    #[inline]
    #[must_use]
    pub fn round(&self) -> u32 {
        self.inner.round
    }

    /// Round phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.inner.phase
    }
}

impl From<SnapshotMessage> for AuthoritativeSnapshot {
    fn from(message: SnapshotMessage) -> Self {
        Self::new(message)
    }
}

/// Counters kept by the gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Snapshots admitted.
    pub applied: u64,
    /// Snapshots refused as stale or duplicate.
    pub discarded: u64,
}

/// Result of offering a snapshot to the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Newer than anything applied so far.
    Admit,
    /// Not newer than `last_tick`; must be dropped wholesale.
    Stale {
        /// Tick of the most recently applied snapshot.
        last_tick: Tick,
    },
}

/// Monotonic tick gate in front of the reconciliation engine.
#[derive(Clone, Debug, Default)]
pub struct SnapshotGate {
    last_tick: Option<Tick>,
    stats: IngestStats,
}

impl SnapshotGate {
    /// Creates a gate that admits any first snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_tick: None,
            stats: IngestStats {
                applied: 0,
                discarded: 0,
            },
        }
    }

    /// Decides whether `tick` may be applied, recording it if so.
    pub fn admit(&mut self, tick: Tick) -> Admission {
        match self.last_tick {
            Some(last_tick) if tick <= last_tick => {
                self.stats.discarded += 1;
                Admission::Stale { last_tick }
            }
            _ => {
                self.last_tick = Some(tick);
                self.stats.applied += 1;
                Admission::Admit
            }
        }
    }

    /// Tick of the most recently admitted snapshot.
    #[must_use]
    pub const fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Admission counters.
    #[must_use]
    pub const fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Forgets the last tick. A new game may restart tick numbering.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

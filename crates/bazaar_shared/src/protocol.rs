//! Network protocol types shared between client and server.
//!
//! These types are serialized and sent over the network.
//! Both client and server must agree on these definitions.

use serde::{Deserialize, Serialize};

/// Unit template identifier.
pub type UnitId = u32;

/// Player identifier.
pub type PlayerId = u32;

/// Server tick. Strictly increasing for snapshots sent to one client.
pub type Tick = u64;

/// A unit offered in a shop slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopOffer {
    /// Unit template offered.
    pub unit_id: UnitId,
    /// Price in gold.
    pub cost: u32,
}

impl ShopOffer {
    /// Creates an offer.
    #[inline]
    #[must_use]
    pub const fn new(unit_id: UnitId, cost: u32) -> Self {
        Self { unit_id, cost }
    }
}

/// Phase of the current round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Players may spend gold.
    #[default]
    Shopping,
    /// Boards are fighting.
    Combat,
    /// Damage and income are being applied.
    Resolution,
}

/// Full economic state of one player as of `tick`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    /// Server tick the snapshot was generated at.
    pub tick: Tick,
    /// Gold held.
    pub gold: u32,
    /// Rerolls that cost no gold.
    pub free_rerolls: u32,
    /// Shop contents; `None` is an empty slot.
    pub shop_slots: Vec<Option<ShopOffer>>,
    /// Whether the shop is locked for the next round.
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

/// Name of an economic action, used by acknowledgements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    /// Unit purchase.
    BuyUnit,
    /// Shop reroll.
    Reroll,
    /// Experience purchase.
    BuyXp,
    /// Shop lock toggle.
    ToggleShopLock,
}

impl ActionName {
    /// Human-readable label for notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BuyUnit => "Purchase",
            Self::Reroll => "Reroll",
            Self::BuyXp => "Buy XP",
            Self::ToggleShopLock => "Shop lock",
        }
    }
}

/// Explicit acknowledgement of one command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResultMessage {
    /// Which action this answers.
    pub action: ActionName,
    /// Whether the server applied it.
    pub success: bool,
    /// Server-provided reason on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Terminal event for the match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndedMessage {
    /// Winning player.
    pub winner_id: PlayerId,
    /// Winning player's display name.
    pub winner_name: String,
}

/// Messages pushed from server to client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authoritative state push.
    Snapshot(SnapshotMessage),
    /// Per-command acknowledgement.
    ActionResult(ActionResultMessage),
    /// Match is over.
    GameEnded(GameEndedMessage),
}

/// Commands sent from client to server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShopCommand {
    /// Buy the unit in `slot`.
    BuyUnit {
        /// Shop slot index.
        slot: usize,
    },
    /// Replace the shop contents.
    Reroll,
    /// Buy experience.
    BuyXp,
    /// Lock or unlock the shop.
    ToggleShopLock,
}

impl ShopCommand {
    /// The action name acknowledgements for this command carry.
    #[must_use]
    pub const fn action(self) -> ActionName {
        match self {
            Self::BuyUnit { .. } => ActionName::BuyUnit,
            Self::Reroll => ActionName::Reroll,
            Self::BuyXp => ActionName::BuyXp,
            Self::ToggleShopLock => ActionName::ToggleShopLock,
        }
    }
}

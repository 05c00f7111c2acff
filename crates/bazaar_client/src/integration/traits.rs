//! # Integration Traits
//!
//! Seams between the shop core and the rest of the client.
//!
//! ## Architecture (Glass Walls Policy)
//!
//! The core never reaches for a global. Every collaborator is handed in at
//! construction, so tests can drive the core with synthetic snapshots.
//!
//! ```text
//! Core defines:      Collaborator implements:
//! ┌─────────────┐    ┌─────────────┐
//! │ trait Foo   │ ←─ │ impl Foo    │
//! └─────────────┘    └─────────────┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bazaar_shared::{PlayerId, ShopCommand, UnitId};
use crossbeam_channel::Sender;

use crate::error::TransportError;

// ============================================================================
// NETWORKING - Outbound commands
// ============================================================================

/// Hands commands to the networking collaborator.
///
/// Fire-and-forget: `Ok` means the command left the core, not that the
/// server accepted it.
pub trait CommandSink {
    /// Queues one command for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Disconnected`] if the transport is gone.
    fn send(&mut self, command: ShopCommand) -> Result<(), TransportError>;
}

impl CommandSink for Sender<ShopCommand> {
    fn send(&mut self, command: ShopCommand) -> Result<(), TransportError> {
        Sender::send(self, command).map_err(|_| TransportError::Disconnected)
    }
}

// ============================================================================
// SESSION - Connectivity and identity
// ============================================================================

/// Session/connectivity collaborator.
pub trait SessionSource {
    /// Whether the local player is currently in a game.
    fn is_in_game(&self) -> bool;

    /// The local player's id.
    fn local_player_id(&self) -> PlayerId;
}

// ============================================================================
// CATALOG - Unit templates (presentation only)
// ============================================================================

/// Static description of a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitTemplate {
    /// Template id.
    pub unit_id: UnitId,
    /// Display name.
    pub name: String,
    /// Shop tier.
    pub tier: u8,
}

/// Read-only unit lookup. Reconciliation never calls this.
pub trait UnitCatalog {
    /// Looks up a template.
    fn unit_template(&self, unit_id: UnitId) -> Option<&UnitTemplate>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS (For Testing and Tools)
// ============================================================================

/// Sink that records every command.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<ShopCommand>,
    disconnected: bool,
}

impl RecordingSink {
    /// Creates a connected sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink whose every send fails.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            sent: Vec::new(),
            disconnected: true,
        }
    }

    /// Commands sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> &[ShopCommand] {
        &self.sent
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: ShopCommand) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        self.sent.push(command);
        Ok(())
    }
}

/// Session whose in-game flag can be flipped from outside.
#[derive(Clone, Debug)]
pub struct StaticSession {
    in_game: Arc<AtomicBool>,
    player_id: PlayerId,
}

impl StaticSession {
    /// Creates a session that is in game.
    #[must_use]
    pub fn in_game(player_id: PlayerId) -> Self {
        Self {
            in_game: Arc::new(AtomicBool::new(true)),
            player_id,
        }
    }

    /// Sets the in-game flag. Clones share the flag.
    pub fn set_in_game(&self, in_game: bool) {
        self.in_game.store(in_game, Ordering::Relaxed);
    }
}

impl SessionSource for StaticSession {
    fn is_in_game(&self) -> bool {
        self.in_game.load(Ordering::Relaxed)
    }

    fn local_player_id(&self) -> PlayerId {
        self.player_id
    }
}

/// Catalog backed by a map.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    templates: HashMap<UnitId, UnitTemplate>,
}

impl StaticCatalog {
    /// Builds a catalog from templates.
    #[must_use]
    pub fn from_templates(templates: impl IntoIterator<Item = UnitTemplate>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.unit_id, t)).collect(),
        }
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl UnitCatalog for StaticCatalog {
    fn unit_template(&self, unit_id: UnitId) -> Option<&UnitTemplate> {
        self.templates.get(&unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let mut sink = RecordingSink::new();
        sink.send(ShopCommand::Reroll).unwrap();
        sink.send(ShopCommand::BuyUnit { slot: 1 }).unwrap();
        assert_eq!(sink.sent(), &[ShopCommand::Reroll, ShopCommand::BuyUnit { slot: 1 }]);

        let mut dead = RecordingSink::disconnected();
        assert_eq!(dead.send(ShopCommand::BuyXp), Err(TransportError::Disconnected));
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<ShopCommand>();
        CommandSink::send(&mut tx, ShopCommand::ToggleShopLock).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ShopCommand::ToggleShopLock);

        drop(rx);
        assert_eq!(
            CommandSink::send(&mut tx, ShopCommand::Reroll),
            Err(TransportError::Disconnected)
        );
    }

    #[test]
    fn test_session_flag_is_shared() {
        let session = StaticSession::in_game(7);
        let handle = session.clone();
        handle.set_in_game(false);
        assert!(!session.is_in_game());
        assert_eq!(session.local_player_id(), 7);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = StaticCatalog::from_templates([UnitTemplate {
            unit_id: 3,
            name: "Lantern Keeper".into(),
            tier: 1,
        }]);
        assert_eq!(catalog.unit_template(3).map(|t| t.tier), Some(1));
        assert!(catalog.unit_template(4).is_none());
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
        assert!(StaticCatalog::default().is_empty());
    }
}

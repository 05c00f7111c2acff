//! # Client Error Types
//!
//! Everything that can go wrong on the client side of the shop. None of
//! these are fatal to a session: economic errors heal on the next snapshot.

use thiserror::Error;

/// The outbound channel to the networking collaborator is gone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The receiving side of the command channel was dropped.
    #[error("command channel disconnected")]
    Disconnected,
}

/// Reasons a dispatcher request was refused locally.
///
/// A refused request never touches the pending ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Slot index is beyond the shop.
    #[error("slot {slot} out of range (shop has {len} slots)")]
    SlotOutOfRange {
        /// Requested slot.
        slot: usize,
        /// Shop length.
        len: usize,
    },

    /// Slot is empty or its purchase is already in flight.
    #[error("slot {0} has nothing to buy")]
    SlotEmpty(usize),

    /// Not enough displayed gold.
    #[error("insufficient gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold the action costs.
        required: u32,
        /// Gold the check was made against.
        available: i64,
    },

    /// Experience cannot be bought past the level cap.
    #[error("level cap {0} reached")]
    LevelCapReached(u32),

    /// No snapshot has been received yet, or the player left the game.
    #[error("not in game")]
    NotInGame,

    /// The command could not be handed to the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors loading or validating [`crate::ShopConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but a value is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for dispatcher requests.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

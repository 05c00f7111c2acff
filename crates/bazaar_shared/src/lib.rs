//! # BAZAAR Shared
//!
//! Wire types used by both the shop client and the authoritative server.
//!
//! ## CRITICAL RULE
//!
//! This crate describes what travels over the wire and nothing else.
//! The server owns every economic value; the client keeps its optimistic
//! guesses in `bazaar_client` and never sends them back.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod protocol;

pub use codec::{
    decode_command, decode_server_message, encode_command, encode_server_message, CodecError,
};
pub use constants::{
    DEFAULT_MAX_LEVEL, DEFAULT_REROLL_COST, DEFAULT_SHOP_SIZE, DEFAULT_XP_COST, MAX_FRAME_SIZE,
};
pub use protocol::{
    ActionName, ActionResultMessage, GameEndedMessage, PlayerId, RoundPhase, ServerMessage,
    ShopCommand, ShopOffer, SnapshotMessage, Tick, UnitId,
};

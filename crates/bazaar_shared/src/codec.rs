//! # Frame Codec
//!
//! JSON frames for the shop channel. The transport owns framing and
//! delivery; this module only turns one frame into one message.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::constants::MAX_FRAME_SIZE;
use crate::protocol::{ServerMessage, ShopCommand};

/// Errors produced while encoding or decoding a frame.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Frame had no bytes.
    #[error("empty frame")]
    EmptyFrame,

    /// Frame exceeded `MAX_FRAME_SIZE`.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Size of the offending frame.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Frame was not a valid message.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Message could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T, CodecError> {
    if frame.is_empty() {
        return Err(CodecError::EmptyFrame);
    }
    if frame.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: frame.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    serde_json::from_slice(frame).map_err(CodecError::Malformed)
}

/// Encodes a client command.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_command(command: &ShopCommand) -> Result<Vec<u8>, CodecError> {
    encode(command)
}

/// Decodes a client command (server side).
///
/// # Errors
///
/// Returns an error for empty, oversized or malformed frames.
pub fn decode_command(frame: &[u8]) -> Result<ShopCommand, CodecError> {
    decode(frame)
}

/// Encodes a server message (server side).
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_server_message(message: &ServerMessage) -> Result<Vec<u8>, CodecError> {
    encode(message)
}

/// Decodes a server message.
///
/// # Errors
///
/// Returns an error for empty, oversized or malformed frames.
pub fn decode_server_message(frame: &[u8]) -> Result<ServerMessage, CodecError> {
    decode(frame)
}

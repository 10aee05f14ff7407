//! # Frame Codec
//!
//! Symmetric encode/decode between typed payloads and the raw frame bytes
//! carried on a channel. The codec is a seam: the transport only depends on
//! the [`FrameCodec`] trait, so the encoding can change without touching the
//! bus machinery.
//!
//! Decoding must tolerate unknown fields; processes on newer protocol
//! revisions add fields that older processes ignore.

use crate::messages::Channel;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Failed to encode a payload into frame bytes.
#[derive(Debug, Error)]
#[error("Failed to encode frame for channel {channel}: {message}")]
pub struct EncodeError {
    /// The channel the payload was destined for.
    pub channel: Channel,
    /// Underlying serializer message.
    pub message: String,
}

/// Failed to decode frame bytes into a payload.
///
/// Always recovered locally: the transport logs and drops the frame.
#[derive(Debug, Error)]
#[error("Failed to decode frame on channel {channel}: {message}")]
pub struct DecodeError {
    /// The channel the frame arrived on.
    pub channel: Channel,
    /// Underlying deserializer message.
    pub message: String,
}

/// Encodes and decodes channel payloads.
pub trait FrameCodec: Send + Sync {
    /// Serialize a payload to frame bytes.
    fn encode<T: Serialize>(&self, channel: Channel, payload: &T) -> Result<Vec<u8>, EncodeError>;

    /// Deserialize frame bytes into a payload.
    fn decode<T: DeserializeOwned>(&self, channel: Channel, bytes: &[u8]) -> Result<T, DecodeError>;
}

/// Default codec: JSON frames.
///
/// serde_json skips unknown fields on decode, which satisfies the
/// forward-compatibility requirement of the wire contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl FrameCodec for JsonCodec {
    fn encode<T: Serialize>(&self, channel: Channel, payload: &T) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(payload).map_err(|e| EncodeError {
            channel,
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, channel: Channel, bytes: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError {
            channel,
            message: e.to_string(),
        })
    }
}

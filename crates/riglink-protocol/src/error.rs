//! Error types for the protocol layer.
//!
//! Each crate in Riglink defines its own error enum. When you see a
//! `ProtocolError`, the problem is in encoding, decoding, or the
//! cipher transform — not in networking or channel management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing `k`/`v`, wrong
    /// data types, or truncated input. Receive loops treat this as
    /// "drop the message", never as a reason to stop.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The cipher transform rejected the bytes (bad key, corruption).
    /// Surfaces exactly like a decode failure so callers have a single
    /// drop-the-message path.
    #[error("decrypt failed: {0}")]
    Decrypt(String),

    /// The message is invalid at the protocol level — it decoded fine
    /// but violates a rule (e.g. an oversized frame tag).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

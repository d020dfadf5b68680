//! Codec trait and implementations for serializing/deserializing
//! envelopes.
//!
//! The channel layer doesn't care HOW messages become bytes — it
//! talks to anything implementing [`Codec`]. [`JsonCodec`] is the wire
//! default; [`SealedCodec`] wraps any codec with the optional cipher
//! transform, which is how the data channel's encryption toggle is
//! realized without the channel code knowing about keys.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are held by long-lived tasks
/// that Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type. Receive loops
    /// treat any decode error as "drop this message and continue".
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what the controller protocol speaks: human-readable,
/// debuggable with any packet capture, and schema-stable as long as
/// the serde attributes on the envelope types don't change.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Cipher seam
// ---------------------------------------------------------------------------

/// The opaque byte-transform used for channel encryption.
///
/// Riglink treats encryption as an external collaborator: it never
/// inspects the transform, it only requires that `decrypt(encrypt(x))
/// == x`. The data channel and the video channel each get their own
/// independent `Option<Arc<dyn Cipher>>` toggle.
pub trait Cipher: Send + Sync + 'static {
    /// Transforms plaintext bytes into ciphertext.
    fn encrypt(&self, data: &[u8]) -> Vec<u8>;

    /// Reverses [`Cipher::encrypt`].
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decrypt`] on a bad key or corrupted
    /// input — which callers treat exactly like a decode failure.
    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, ProtocolError>;
}

/// A [`Codec`] that applies an optional cipher around an inner codec.
///
/// Encode: inner encode, then encrypt. Decode: decrypt, then inner
/// decode. With no cipher configured it is a transparent passthrough,
/// so channel code holds one `SealedCodec` either way.
#[derive(Clone)]
pub struct SealedCodec<C: Codec> {
    inner: C,
    cipher: Option<Arc<dyn Cipher>>,
}

impl<C: Codec> SealedCodec<C> {
    /// Wraps `inner`, encrypting/decrypting when `cipher` is set.
    pub fn new(inner: C, cipher: Option<Arc<dyn Cipher>>) -> Self {
        Self { inner, cipher }
    }
}

impl<C: Codec> Codec for SealedCodec<C> {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        let bytes = self.inner.encode(value)?;
        Ok(match &self.cipher {
            Some(cipher) => cipher.encrypt(&bytes),
            None => bytes,
        })
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        match &self.cipher {
            Some(cipher) => {
                let plain = cipher.decrypt(data)?;
                self.inner.decode(&plain)
            }
            None => self.inner.decode(data),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

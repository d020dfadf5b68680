//! Wire protocol for Riglink.
//!
//! This crate defines the "language" the client and the controller
//! speak:
//!
//! - **Types** ([`Envelope`], [`Kind`], the command/response
//!   constants) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`SealedCodec`]) —
//!   how those messages become bytes, including the optional cipher
//!   transform.
//! - **Frames** ([`VideoFrame`]) — the tag+payload layout of the
//!   video channel.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while
//!   encoding or decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the
//! channel manager (dispatch). It knows nothing about sockets or
//! restart policy — only how to serialize and deserialize.

mod codec;
mod error;
mod frame;
mod types;

pub use codec::{Cipher, Codec, JsonCodec, SealedCodec};
pub use error::ProtocolError;
pub use frame::VideoFrame;
pub use types::{
    now_millis, Envelope, Kind, CMD_CONN_NEW, CMD_DESTROY, CMD_DISCONNECT,
    CMD_RESTART, RESPONSE_ACCEPT, RESPONSE_OK, RESPONSE_RECV,
};

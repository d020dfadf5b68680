//! Error types for the channel layer.

use riglink_protocol::ProtocolError;
use riglink_transport::TransportError;

/// Errors from the channel manager and its dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// An endpoint failed underneath the manager.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding an outbound envelope failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The manager was asked to operate before `bind` succeeded.
    #[error("channel not bound: {0}")]
    NotBound(&'static str),
}

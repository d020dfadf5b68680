//! Unified error type for the Riglink client.

use riglink_channel::ChannelError;
use riglink_device::DeviceError;
use riglink_protocol::ProtocolError;
use riglink_transport::TransportError;
use riglink_video::VideoError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `riglink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RiglinkError {
    /// A transport-level error (bind, connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, decrypt).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A channel-level error (dispatch, rebind).
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A video-level error (capture, encode, publish).
    #[error(transparent)]
    Video(#[from] VideoError),

    /// A device-level error (command, lifecycle).
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A raw I/O error from the discovery listener.
    #[error("discovery i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for the video layer.

use riglink_protocol::ProtocolError;
use riglink_transport::TransportError;

/// Errors from the video publisher and its collaborators.
///
/// The publish loop never propagates these out of `run` — every one of
/// them maps to "drop the frame, maybe recycle the socket, keep going".
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    /// Dialing or sending on the video socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Building the wire frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The frame source could not produce a frame.
    #[error("frame source failed: {0}")]
    Source(String),

    /// The encoder could not process a frame.
    #[error("frame encoding failed: {0}")]
    Encode(String),
}

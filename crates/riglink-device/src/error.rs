//! Error types for the device layer.

/// Errors a [`Device`](crate::Device) implementation can report.
///
/// The communication core never treats these as fatal: a rejected
/// command is logged and the channel keeps running.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device rejected or could not execute a command.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The device is not reachable (unplugged, port busy, resetting).
    #[error("device unavailable: {0}")]
    Unavailable(String),

    /// Talking to the device failed at the I/O level.
    #[error("device i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

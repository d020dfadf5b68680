//! Transport layer for Riglink.
//!
//! Three endpoint shapes cover every channel the client runs:
//!
//! - [`PushEndpoint`] — bind locally, the controller connects and
//!   *receives* (status / command-out channel).
//! - [`PullEndpoint`] — bind locally, the controller connects and
//!   *sends* (command-in channel).
//! - [`DialSender`] — connect out to the controller (video channel).
//!
//! All three frame messages over WebSocket via `tokio-tungstenite`.
//! Bound endpoints move messages through a [`SlotQueue`], which is
//! where the conflate delivery policy lives: with conflate on, only
//! the most recently produced, unconsumed message survives. Endpoints
//! are recreated wholesale on failure — there is no in-place repair.

mod dial;
mod error;
mod pull;
mod push;
mod slot;

pub use dial::DialSender;
pub use error::TransportError;
pub use pull::PullEndpoint;
pub use push::PushEndpoint;
pub use slot::SlotQueue;

/// Delivery options for a bound endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointOptions {
    /// Keep only the latest unread message (latest-wins). On by default.
    pub conflate: bool,
    /// Wait briefly for queued messages to flush on close. Off by
    /// default, so closing never blocks on a dead peer.
    pub linger: bool,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            conflate: true,
            linger: false,
        }
    }
}

//! In-process control queue.
//!
//! Other tasks (discovery, status push, the device) talk to the
//! channel manager by posting control envelopes here. The manager's
//! receive loop consumes them alongside wire traffic, so a control
//! message goes through exactly the same dispatch table as a command
//! from the controller.

use riglink_protocol::Envelope;
use tokio::sync::mpsc;

/// Cheap cloneable handle for posting control messages to a running
/// channel manager.
#[derive(Clone)]
pub struct ControlInjector {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ControlInjector {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Posts a control value (`SELF` kind) to the manager.
    ///
    /// Best-effort: if the manager's loop has already exited the
    /// message is dropped, which is the right outcome during shutdown.
    pub fn post(&self, value: impl Into<String>) {
        self.post_envelope(Envelope::control(value));
    }

    /// Posts a pre-built envelope to the manager.
    pub fn post_envelope(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            tracing::debug!("control queue closed, message dropped");
        }
    }
}

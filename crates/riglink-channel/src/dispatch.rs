//! The dispatch table: what each inbound envelope does.
//!
//! Reserved command values manipulate the link itself; everything else
//! is acknowledged and forwarded to the device. Control (`SELF`)
//! envelopes arrive from the in-process queue and either act locally
//! or get relayed back out as commands.

use std::time::Duration;

use riglink_device::Device;
use riglink_protocol::{
    Envelope, Kind, CMD_DESTROY, CMD_DISCONNECT, CMD_RESTART, RESPONSE_OK,
    RESPONSE_RECV,
};

use crate::manager::ChannelManager;

/// Bound on flushing the final `OK` before teardown begins.
const DESTROY_ACK_FLUSH: Duration = Duration::from_secs(1);

impl<D: Device> ChannelManager<D> {
    /// Routes one envelope by kind.
    pub(crate) async fn dispatch(&mut self, envelope: Envelope) {
        match envelope.kind {
            Kind::Command => self.dispatch_command(envelope).await,
            Kind::Control => self.dispatch_control(envelope).await,
            Kind::Discovery => {
                // Discovery traffic belongs on its own listener.
                tracing::debug!(
                    value = %envelope.value,
                    "discovery envelope on command channel, ignored"
                );
            }
        }
    }

    /// Handles a command from the controller.
    async fn dispatch_command(&mut self, envelope: Envelope) {
        let value = envelope.value.as_str();
        match value {
            CMD_DISCONNECT => {
                tracing::info!("controller disconnected");
                self.ack(RESPONSE_OK);
                self.state.set_connected(false);
            }
            CMD_RESTART => {
                tracing::info!("controller requested video restart");
                self.ack(RESPONSE_OK);
                self.state.request_video_restart();
            }
            CMD_DESTROY => {
                tracing::info!("controller requested shutdown");
                self.ack(RESPONSE_OK);
                // The ack must reach the controller before shutdown
                // tears the status endpoint down under it.
                if let Some(push) = &self.push {
                    push.flush(DESTROY_ACK_FLUSH).await;
                }
                self.state.begin_shutdown();
            }
            "" => {
                // Keepalive padding from some controllers.
                tracing::trace!("empty command ignored");
            }
            _ => {
                tracing::debug!(command = %value, "forwarding command to device");
                self.ack(RESPONSE_RECV);
                if let Err(e) = self.device.send_command(value).await {
                    tracing::warn!(
                        command = %value, error = %e,
                        "device rejected command"
                    );
                }
            }
        }
    }

    /// Handles a self-addressed control message.
    ///
    /// `RESTART` recycles this channel pair and the video socket; any
    /// other value is relayed to the controller as a command, which is
    /// how other tasks publish on the status channel without holding
    /// an endpoint.
    async fn dispatch_control(&mut self, envelope: Envelope) {
        if envelope.value == CMD_RESTART {
            tracing::info!("control restart, recycling channels");
            self.state.request_video_restart();
            self.restart().await;
        } else {
            let mut relay = envelope;
            relay.kind = Kind::Command;
            if let Err(e) = self.send_envelope(relay) {
                tracing::warn!(error = %e, "control relay failed");
            }
        }
    }

    /// Best-effort acknowledgment on the status channel.
    fn ack(&self, value: &str) {
        if let Err(e) = self.send(value) {
            tracing::warn!(error = %e, "ack failed");
        }
    }
}

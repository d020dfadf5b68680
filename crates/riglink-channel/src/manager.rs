//! The channel manager: owns the command/status endpoint pair and runs
//! the receive/dispatch loop.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use riglink_device::Device;
use riglink_protocol::{Codec, Envelope, JsonCodec, SealedCodec};
use riglink_transport::{
    EndpointOptions, PullEndpoint, PushEndpoint, TransportError,
};
use tokio::sync::mpsc;

use crate::control::ControlInjector;
use crate::state::LinkState;
use crate::ChannelError;

/// How long a failed rebind backs off before the next attempt.
const REBIND_RETRY: Duration = Duration::from_secs(1);

/// Where and how the channel pair binds.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Local interface to bind on.
    pub bind_ip: IpAddr,
    /// Outbound (status/response) port. `0` picks an ephemeral port.
    pub status_port: u16,
    /// Inbound (command) port. `0` picks an ephemeral port.
    pub data_port: u16,
    /// Queue behavior for both endpoints.
    pub options: EndpointOptions,
    /// Pause between dropping dead endpoints and rebinding, so the OS
    /// releases the ports first.
    pub settle_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::from([0, 0, 0, 0]),
            status_port: 6668,
            data_port: 6666,
            options: EndpointOptions::default(),
            settle_delay: Duration::from_secs(1),
        }
    }
}

/// What one pass of the receive loop observed. Built inside the
/// `select!` so the endpoint borrows end before dispatch runs.
enum LoopEvent {
    Control(Envelope),
    Wire(Result<Vec<u8>, TransportError>),
    Shutdown,
}

/// Owns the status (outbound) and command (inbound) endpoints, plus
/// the dispatch loop that ties them to the device and the link state.
///
/// The manager heals itself: when the inbound endpoint dies it drops
/// both endpoints, waits out the settle delay, and rebinds on the same
/// ports. Callers never see a transport error from `run`.
pub struct ChannelManager<D: Device> {
    pub(crate) config: ChannelConfig,
    pub(crate) codec: SealedCodec<JsonCodec>,
    pub(crate) device: Arc<D>,
    pub(crate) state: Arc<LinkState>,
    pub(crate) push: Option<PushEndpoint>,
    pub(crate) pull: Option<PullEndpoint>,
    control_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl<D: Device> ChannelManager<D> {
    /// Creates an unbound manager and the injector handle other tasks
    /// use to post control messages into its loop.
    pub fn new(
        config: ChannelConfig,
        codec: SealedCodec<JsonCodec>,
        device: Arc<D>,
        state: Arc<LinkState>,
    ) -> (Self, ControlInjector) {
        let (injector, control_rx) = ControlInjector::new();
        let manager = Self {
            config,
            codec,
            device,
            state,
            push: None,
            pull: None,
            control_rx,
        };
        (manager, injector)
    }

    /// Binds both endpoints.
    ///
    /// # Errors
    /// Returns [`ChannelError::Transport`] if either port can't be
    /// bound; nothing stays half-bound on failure.
    pub async fn bind(&mut self) -> Result<(), ChannelError> {
        let ip = self.config.bind_ip;
        let push = PushEndpoint::bind(
            &format!("{ip}:{}", self.config.status_port),
            self.config.options,
        )
        .await?;
        let pull = match PullEndpoint::bind(
            &format!("{ip}:{}", self.config.data_port),
            self.config.options,
        )
        .await
        {
            Ok(pull) => pull,
            Err(e) => {
                push.close().await;
                return Err(e.into());
            }
        };

        tracing::info!(
            status = %push.local_addr(),
            command = %pull.local_addr(),
            "channel pair bound"
        );
        self.push = Some(push);
        self.pull = Some(pull);
        Ok(())
    }

    /// The actual (status, command) ports, once bound. Matters when
    /// the config asked for ephemeral ports.
    pub fn bound_ports(&self) -> Option<(u16, u16)> {
        match (&self.push, &self.pull) {
            (Some(push), Some(pull)) => {
                Some((push.local_addr().port(), pull.local_addr().port()))
            }
            _ => None,
        }
    }

    /// Sends a response value on the status channel.
    pub fn send(&self, value: impl Into<String>) -> Result<(), ChannelError> {
        self.send_envelope(Envelope::command(value))
    }

    /// Sends a pre-built envelope on the status channel.
    ///
    /// No-op while no controller is known: there is nobody to talk to,
    /// and queueing responses for a future controller would replay
    /// stale state at it.
    pub fn send_envelope(
        &self,
        envelope: Envelope,
    ) -> Result<(), ChannelError> {
        if self.state.peer().is_none() {
            tracing::debug!(value = %envelope.value, "no controller, dropping outbound");
            return Ok(());
        }
        let Some(push) = &self.push else {
            tracing::debug!(value = %envelope.value, "status endpoint down, dropping outbound");
            return Ok(());
        };
        let bytes = self.codec.encode(&envelope)?;
        push.send(bytes);
        Ok(())
    }

    /// Drops both endpoints and rebinds them on the same ports.
    ///
    /// Retries until the rebind succeeds or shutdown begins. Safe to
    /// call with endpoints already gone.
    pub async fn restart(&mut self) {
        tracing::info!("restarting channel pair");
        if let Some(push) = self.push.take() {
            push.close().await;
        }
        self.pull = None;

        tokio::time::sleep(self.config.settle_delay).await;

        while !self.state.is_shutting_down() {
            match self.bind().await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "channel rebind failed, retrying");
                    tokio::time::sleep(REBIND_RETRY).await;
                }
            }
        }
    }

    /// Runs the receive/dispatch loop until shutdown.
    ///
    /// Consumes the manager; the endpoints close when the loop exits.
    pub async fn run(mut self) {
        let mut shutdown = self.state.shutdown_signal();
        let mut control_open = true;

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            if self.pull.is_none() {
                self.restart().await;
                continue;
            }

            let event = {
                // Field borrows stay inside this block so dispatch can
                // take `&mut self` afterwards.
                let pull = match self.pull.as_ref() {
                    Some(pull) => pull,
                    None => continue,
                };
                tokio::select! {
                    maybe = self.control_rx.recv(), if control_open => {
                        match maybe {
                            Some(env) => LoopEvent::Control(env),
                            None => {
                                control_open = false;
                                continue;
                            }
                        }
                    }
                    res = pull.recv() => LoopEvent::Wire(res),
                    _ = shutdown.changed() => LoopEvent::Shutdown,
                }
            };

            match event {
                LoopEvent::Shutdown => break,
                LoopEvent::Control(envelope) => {
                    self.dispatch(envelope).await;
                }
                LoopEvent::Wire(Ok(data)) => {
                    match self.codec.decode::<Envelope>(&data) {
                        Ok(envelope) => self.dispatch(envelope).await,
                        Err(e) => {
                            tracing::debug!(error = %e, "undecodable message dropped");
                        }
                    }
                }
                LoopEvent::Wire(Err(e)) => {
                    tracing::warn!(error = %e, "command endpoint lost");
                    self.restart().await;
                }
            }
        }

        tracing::info!("channel loop stopped");
        if let Some(push) = self.push.take() {
            push.close().await;
        }
    }
}

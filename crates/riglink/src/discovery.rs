//! Discovery listener: how a controller finds and claims this rig.
//!
//! The exchange is one short TCP round trip, deliberately outside the
//! WebSocket channels so a controller can probe with nothing but a
//! plain socket:
//!
//!   1. Controller connects and sends `{"k":"CONN","v":"NEW"}`
//!   2. Client records the controller's address as the peer
//!   3. Client replies `ACCEPT` with its hostname and closes
//!   4. Client posts a restart so every channel re-homes to the new
//!      controller
//!
//! The listener serves one probe at a time and never stops on error:
//! a bad payload is logged and dropped, a lost listener is rebound.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use riglink_channel::{ControlInjector, LinkState};
use riglink_protocol::{
    Codec, Envelope, JsonCodec, Kind, ProtocolError, SealedCodec,
    CMD_CONN_NEW, CMD_RESTART, RESPONSE_ACCEPT,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::RiglinkError;

/// Bound on reading the handshake request from a connected probe.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Backoff after a listener-level failure before rebinding.
const REBIND_RETRY: Duration = Duration::from_secs(2);

/// Handshake requests fit well under this; anything longer is not a
/// controller.
const MAX_REQUEST: usize = 1024;

pub(crate) type OnConnect = Arc<dyn Fn(IpAddr) + Send + Sync>;

/// The bound discovery listener and its collaborators.
pub(crate) struct DiscoveryListener {
    listener: TcpListener,
    bind_addr: String,
    hostname: String,
    codec: SealedCodec<JsonCodec>,
    state: Arc<LinkState>,
    control: ControlInjector,
    on_connect: Option<OnConnect>,
}

impl DiscoveryListener {
    /// Binds the listener so the caller learns the real port before
    /// any task spawns.
    pub(crate) async fn bind(
        bind_addr: String,
        hostname: String,
        codec: SealedCodec<JsonCodec>,
        state: Arc<LinkState>,
        control: ControlInjector,
        on_connect: Option<OnConnect>,
    ) -> Result<Self, RiglinkError> {
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "discovery listener bound");
        Ok(Self {
            listener,
            bind_addr,
            hostname,
            codec,
            state,
            control,
            on_connect,
        })
    }

    pub(crate) fn local_port(&self) -> Result<u16, RiglinkError> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Serves handshakes until shutdown. Rebinds the listener if it is
    /// ever lost; never returns early.
    pub(crate) async fn run(mut self) {
        let mut shutdown = self.state.shutdown_signal();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let accepted = tokio::select! {
                res = self.listener.accept() => res,
                _ = shutdown.changed() => continue,
            };

            match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = self.handle_probe(stream, peer.ip()).await
                    {
                        tracing::debug!(
                            %peer, error = %e,
                            "discovery probe rejected"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "discovery accept failed, rebinding");
                    tokio::select! {
                        _ = tokio::time::sleep(REBIND_RETRY) => {}
                        _ = shutdown.changed() => continue,
                    }
                    match TcpListener::bind(&self.bind_addr).await {
                        Ok(listener) => self.listener = listener,
                        Err(e) => {
                            tracing::warn!(error = %e, "discovery rebind failed");
                        }
                    }
                }
            }
        }

        tracing::info!("discovery listener stopped");
    }

    /// One probe: read the request, validate, reply, re-home channels.
    async fn handle_probe(
        &self,
        mut stream: TcpStream,
        peer: IpAddr,
    ) -> Result<(), RiglinkError> {
        let mut buf = [0u8; MAX_REQUEST];
        let n = match tokio::time::timeout(
            READ_TIMEOUT,
            stream.read(&mut buf),
        )
        .await
        {
            Ok(read) => read?,
            Err(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "discovery read timed out".into(),
                )
                .into());
            }
        };
        if n == 0 {
            return Err(ProtocolError::InvalidMessage(
                "probe closed without a request".into(),
            )
            .into());
        }

        let request: Envelope = self.codec.decode(&buf[..n])?;
        if request.kind != Kind::Discovery || request.value != CMD_CONN_NEW {
            return Err(ProtocolError::InvalidMessage(format!(
                "unexpected discovery request {}:{}",
                request.kind, request.value
            ))
            .into());
        }

        tracing::info!(%peer, "controller discovered");
        self.state.set_peer(peer);

        let reply = Envelope::command(RESPONSE_ACCEPT)
            .with_hostname(&self.hostname);
        stream.write_all(&self.codec.encode(&reply)?).await?;
        stream.flush().await?;

        if let Some(hook) = &self.on_connect {
            hook(peer);
        }
        // Re-home every channel to the new controller.
        self.control.post(CMD_RESTART);
        Ok(())
    }
}

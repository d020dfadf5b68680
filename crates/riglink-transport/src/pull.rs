//! Inbound (pull) endpoint: binds locally, the controller connects to
//! it and pushes commands which the client consumes one at a time.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::slot::SlotQueue;
use crate::{EndpointOptions, TransportError};

/// Poll interval for re-checking endpoint liveness inside `recv`.
const RECV_POLL: Duration = Duration::from_millis(500);

/// A bound inbound endpoint.
///
/// A reader task accepts one peer at a time and feeds its messages
/// through a [`SlotQueue`]; `recv` consumes them. Conflate (default)
/// means a burst of commands collapses to the most recent one.
pub struct PullEndpoint {
    local_addr: SocketAddr,
    queue: Arc<SlotQueue<Vec<u8>>>,
    dead: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl PullEndpoint {
    /// Binds the endpoint and starts its reader task.
    pub async fn bind(
        addr: &str,
        options: EndpointOptions,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::BindFailed)?;

        let queue = Arc::new(SlotQueue::new(options.conflate));
        let dead = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(reader_loop(
            listener,
            Arc::clone(&queue),
            Arc::clone(&dead),
        ));

        tracing::info!(%local_addr, "pull endpoint bound");
        Ok(Self {
            local_addr,
            queue,
            dead,
            reader,
        })
    }

    /// Waits for the next inbound message.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectionClosed`] once the endpoint's
    /// listener is lost — the caller's recovery path is a full restart.
    pub async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        loop {
            if let Some(data) = self.queue.try_pull() {
                return Ok(data);
            }
            if self.dead.load(Ordering::Acquire) {
                return Err(TransportError::ConnectionClosed(
                    "pull endpoint listener lost".into(),
                ));
            }
            tokio::select! {
                _ = self.queue.wait() => {}
                _ = tokio::time::sleep(RECV_POLL) => {}
            }
        }
    }

    /// The address this endpoint is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for PullEndpoint {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Accepts one peer at a time and pushes its messages into the queue.
/// Peer-level failures detach the peer and re-accept; a listener-level
/// failure marks the endpoint dead so `recv` reports it.
async fn reader_loop(
    listener: TcpListener,
    queue: Arc<SlotQueue<Vec<u8>>>,
    dead: Arc<AtomicBool>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "pull endpoint accept failed");
                dead.store(true, Ordering::Release);
                return;
            }
        };

        let mut ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::debug!(error = %e, %peer, "peer handshake failed");
                continue;
            }
        };
        tracing::debug!(%peer, "peer attached to pull endpoint");

        use futures_util::StreamExt;
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Binary(data)) => queue.push(data.into()),
                Ok(Message::Text(text)) => {
                    queue.push(text.as_bytes().to_vec());
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => continue, // skip ping/pong/frame
                Err(e) => {
                    tracing::debug!(error = %e, %peer, "peer read failed, detaching");
                    break;
                }
            }
        }
    }
}

//! Outbound (push) endpoint: binds locally, the controller connects
//! to it and receives whatever the client publishes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::slot::SlotQueue;
use crate::{EndpointOptions, TransportError};

/// How long a failed accept backs off before the listener retries.
const ACCEPT_RETRY: Duration = Duration::from_secs(1);

/// Grace period for draining queued messages when `linger` is on.
const LINGER_GRACE: Duration = Duration::from_millis(500);

/// A bound outbound endpoint.
///
/// The peer connects in; at most one subscriber is served at a time.
/// Messages pass through a [`SlotQueue`], so with conflate on (the
/// default) only the latest unread message survives backpressure.
/// Sends never block the caller — delivery happens on a pump task.
pub struct PushEndpoint {
    local_addr: SocketAddr,
    options: EndpointOptions,
    queue: Arc<SlotQueue<Vec<u8>>>,
    busy: Arc<AtomicBool>,
    pump: JoinHandle<()>,
}

impl PushEndpoint {
    /// Binds the endpoint and starts its delivery pump.
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
        let busy = Arc::new(AtomicBool::new(false));
        let pump = tokio::spawn(pump_loop(
            listener,
            Arc::clone(&queue),
            Arc::clone(&busy),
        ));

        tracing::info!(%local_addr, "push endpoint bound");
        Ok(Self {
            local_addr,
            options,
            queue,
            busy,
            pump,
        })
    }

    /// Enqueues a message for the current (or next) subscriber.
    ///
    /// Best-effort: if no subscriber ever attaches, conflate mode keeps
    /// discarding all but the latest message. Delivery failures are
    /// handled by the pump, not surfaced here.
    pub fn send(&self, data: Vec<u8>) {
        self.queue.push(data);
    }

    /// The address this endpoint is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits until every queued message has been handed to the current
    /// subscriber, or until `timeout` elapses.
    ///
    /// With no subscriber attached nothing can drain, so the full
    /// timeout is spent — callers use this right before teardown when
    /// a final message must get out first.
    pub async fn flush(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while (!self.queue.is_empty()
            || self.busy.load(Ordering::Acquire))
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Closes the endpoint.
    ///
    /// With `linger` off (the default) queued messages are abandoned
    /// immediately. With `linger` on, the pump gets a bounded grace
    /// period to drain the queue first.
    pub async fn close(self) {
        if self.options.linger {
            let deadline = tokio::time::Instant::now() + LINGER_GRACE;
            while !self.queue.is_empty()
                && tokio::time::Instant::now() < deadline
            {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
        // Drop aborts the pump and releases the listener.
    }
}

impl Drop for PushEndpoint {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Serves one subscriber at a time: accept, drain the queue into the
/// socket until the subscriber drops, accept the next.
///
/// `busy` is held high from dequeue to send completion, so `flush` can
/// tell "queue empty" apart from "last message still in flight".
async fn pump_loop(
    listener: TcpListener,
    queue: Arc<SlotQueue<Vec<u8>>>,
    busy: Arc<AtomicBool>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "push endpoint accept failed");
                tokio::time::sleep(ACCEPT_RETRY).await;
                continue;
            }
        };

        let mut ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::debug!(error = %e, %peer, "subscriber handshake failed");
                continue;
            }
        };
        tracing::debug!(%peer, "subscriber attached to push endpoint");

        loop {
            let data = queue.pull().await;
            busy.store(true, Ordering::Release);
            use futures_util::SinkExt;
            let sent = ws.send(Message::Binary(data.into())).await;
            busy.store(false, Ordering::Release);
            if let Err(e) = sent {
                tracing::debug!(error = %e, %peer, "subscriber send failed, detaching");
                break;
            }
        }
    }
}

//! Outbound dialer used by the video publisher: connects to a remote
//! listener and sends with bounded timeouts so a dead peer can never
//! wedge the publish loop.

use std::time::Duration;

use tokio_tungstenite::tungstenite::Message;

use crate::TransportError;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A connected outbound sender.
///
/// Not self-healing on its own: on [`TransportError::Timeout`] or a
/// send failure the owner is expected to drop it and dial a fresh one
/// (close-and-recreate, never repair in place).
pub struct DialSender {
    ws: WsStream,
    send_timeout: Duration,
}

impl DialSender {
    /// Dials `addr` (host:port), giving up after `connect_timeout`.
    pub async fn connect(
        addr: &str,
        connect_timeout: Duration,
        send_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let url = format!("ws://{addr}");
        let connect = tokio_tungstenite::connect_async(&url);
        match tokio::time::timeout(connect_timeout, connect).await {
            Ok(Ok((ws, _response))) => {
                tracing::debug!(%addr, "dial sender connected");
                Ok(Self { ws, send_timeout })
            }
            Ok(Err(e)) => Err(TransportError::ConnectFailed(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e),
            )),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    /// Sends one message, bounded by the configured send timeout.
    pub async fn send(&mut self, data: Vec<u8>) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        let msg = Message::Binary(data.into());
        match tokio::time::timeout(self.send_timeout, self.ws.send(msg)).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::SendFailed(
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, e),
            )),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    /// Closes the connection, ignoring close-time errors.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

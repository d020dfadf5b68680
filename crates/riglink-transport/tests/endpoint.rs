//! Integration tests for the channel endpoints.
//!
//! These spin up real sockets on loopback to verify that data flows
//! through the push/pull/dial endpoints, including the conflate
//! delivery policy observable from the peer side.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use riglink_transport::{
    DialSender, EndpointOptions, PullEndpoint, PushEndpoint,
};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Helper: connects a tokio-tungstenite client to the given address.
async fn connect_client(addr: &str) -> ClientWs {
    let url = format!("ws://{addr}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("client should connect");
    ws
}

#[tokio::test]
async fn test_push_endpoint_delivers_to_subscriber() {
    let push = PushEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = push.local_addr().to_string();

    let mut subscriber = connect_client(&addr).await;
    // Give the pump a moment to finish the server-side handshake.
    tokio::time::sleep(Duration::from_millis(50)).await;

    push.send(b"status update".to_vec());

    let msg = tokio::time::timeout(Duration::from_secs(2), subscriber.next())
        .await
        .expect("should not time out")
        .expect("stream should yield")
        .expect("message should be ok");
    assert_eq!(msg.into_data().as_ref(), b"status update");
}

#[tokio::test]
async fn test_push_endpoint_conflates_before_subscriber_attaches() {
    // Two sends with no subscriber: only the latest survives, so the
    // first message the subscriber sees is m2.
    let push = PushEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = push.local_addr().to_string();

    push.send(b"m1".to_vec());
    push.send(b"m2".to_vec());

    let mut subscriber = connect_client(&addr).await;
    let msg = tokio::time::timeout(Duration::from_secs(2), subscriber.next())
        .await
        .expect("should not time out")
        .expect("stream should yield")
        .expect("message should be ok");
    assert_eq!(msg.into_data().as_ref(), b"m2");
}

#[tokio::test]
async fn test_push_endpoint_fifo_preserves_all_messages() {
    let options = EndpointOptions {
        conflate: false,
        linger: false,
    };
    let push = PushEndpoint::bind("127.0.0.1:0", options)
        .await
        .expect("should bind");
    let addr = push.local_addr().to_string();

    push.send(b"first".to_vec());
    push.send(b"second".to_vec());

    let mut subscriber = connect_client(&addr).await;
    for expected in [b"first".as_slice(), b"second".as_slice()] {
        let msg =
            tokio::time::timeout(Duration::from_secs(2), subscriber.next())
                .await
                .expect("should not time out")
                .expect("stream should yield")
                .expect("message should be ok");
        assert_eq!(msg.into_data().as_ref(), expected);
    }
}

#[tokio::test]
async fn test_flush_completes_after_subscriber_takes_message() {
    let push = PushEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = push.local_addr().to_string();

    let mut subscriber = connect_client(&addr).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    push.send(b"last words".to_vec());
    push.flush(Duration::from_secs(2)).await;

    // After flush returns, the message is already on its way to the
    // subscriber, even if the endpoint is dropped right now.
    drop(push);
    let msg = tokio::time::timeout(Duration::from_secs(2), subscriber.next())
        .await
        .expect("should not time out")
        .expect("stream should yield")
        .expect("message should be ok");
    assert_eq!(msg.into_data().as_ref(), b"last words");
}

#[tokio::test]
async fn test_flush_spends_timeout_with_no_subscriber() {
    let push = PushEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    push.send(b"stranded".to_vec());

    let started = tokio::time::Instant::now();
    push.flush(Duration::from_millis(200)).await;
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_pull_endpoint_receives_from_peer() {
    let pull = PullEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = pull.local_addr().to_string();

    let mut peer = connect_client(&addr).await;
    peer.send(Message::Binary(b"a command".to_vec().into()))
        .await
        .expect("peer send should succeed");

    let received = tokio::time::timeout(Duration::from_secs(2), pull.recv())
        .await
        .expect("should not time out")
        .expect("recv should succeed");
    assert_eq!(received, b"a command");
}

#[tokio::test]
async fn test_pull_endpoint_accepts_text_frames() {
    let pull = PullEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = pull.local_addr().to_string();

    let mut peer = connect_client(&addr).await;
    peer.send(Message::Text("{\"k\":\"CMD\",\"v\":\"X\"}".into()))
        .await
        .expect("peer send should succeed");

    let received = tokio::time::timeout(Duration::from_secs(2), pull.recv())
        .await
        .expect("should not time out")
        .expect("recv should succeed");
    assert_eq!(received, b"{\"k\":\"CMD\",\"v\":\"X\"}");
}

#[tokio::test]
async fn test_pull_endpoint_survives_peer_disconnect() {
    // A peer dropping must not kill the endpoint — the next peer's
    // messages still come through.
    let pull = PullEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = pull.local_addr().to_string();

    let mut first = connect_client(&addr).await;
    first
        .send(Message::Close(None))
        .await
        .expect("close should send");
    drop(first);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut second = connect_client(&addr).await;
    second
        .send(Message::Binary(b"after reconnect".to_vec().into()))
        .await
        .expect("peer send should succeed");

    let received = tokio::time::timeout(Duration::from_secs(2), pull.recv())
        .await
        .expect("should not time out")
        .expect("recv should succeed");
    assert_eq!(received, b"after reconnect");
}

#[tokio::test]
async fn test_dial_sender_delivers_to_pull_endpoint() {
    let pull = PullEndpoint::bind("127.0.0.1:0", EndpointOptions::default())
        .await
        .expect("should bind");
    let addr = pull.local_addr().to_string();

    let mut sender = DialSender::connect(
        &addr,
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .await
    .expect("should connect");

    sender
        .send(b"frame bytes".to_vec())
        .await
        .expect("send should succeed");

    let received = tokio::time::timeout(Duration::from_secs(2), pull.recv())
        .await
        .expect("should not time out")
        .expect("recv should succeed");
    assert_eq!(received, b"frame bytes");

    sender.close().await;
}

#[tokio::test]
async fn test_dial_sender_connect_times_out_on_silent_listener() {
    // A raw TCP listener that never answers the WebSocket handshake:
    // connect must give up with Timeout instead of hanging.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("addr").to_string();

    let result = DialSender::connect(
        &addr,
        Duration::from_millis(200),
        Duration::from_secs(1),
    )
    .await;
    assert!(matches!(
        result,
        Err(riglink_transport::TransportError::Timeout)
    ));
}

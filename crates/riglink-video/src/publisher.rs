//! The publish loop: latest frame in, one tagged wire message out.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use riglink_channel::LinkState;
use riglink_protocol::{Cipher, VideoFrame};
use riglink_transport::{DialSender, SlotQueue};
use tokio::sync::watch;

use crate::frame::{Frame, FrameEncoder, FrameSource};
use crate::VideoError;

/// Pause after a failed capture before the source is retried.
const CAPTURE_RETRY: Duration = Duration::from_millis(200);

/// How the publisher dials and paces itself.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Port the controller's video sink listens on.
    pub video_port: u16,
    /// Goes into every frame tag as `<hostname>@<millis>`.
    pub hostname: String,
    /// Bound on dialing the controller.
    pub connect_timeout: Duration,
    /// Bound on each frame send.
    pub send_timeout: Duration,
    /// Base pause before re-dialing after a failure.
    pub reconnect_delay: Duration,
    /// Random extra pause on top of `reconnect_delay`, so a fleet of
    /// rigs doesn't re-dial a recovering controller in lockstep.
    pub reconnect_jitter: Duration,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            video_port: 5555,
            hostname: "riglink".to_string(),
            connect_timeout: Duration::from_secs(2),
            send_timeout: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(1),
            reconnect_jitter: Duration::from_millis(500),
        }
    }
}

/// Publishes the latest captured frame to the controller's video sink.
///
/// Frames flow through a conflating [`SlotQueue`]: a slow link means
/// the controller sees fewer frames, never older ones. The socket is
/// close-and-recreate — any send failure drops it, and the next frame
/// dials fresh. Send outcomes drive the link's `connected` flag.
pub struct VideoPublisher<E: FrameEncoder> {
    config: VideoConfig,
    encoder: E,
    cipher: Option<Arc<dyn Cipher>>,
    state: Arc<LinkState>,
    frames: Arc<SlotQueue<Frame>>,
    sender: Option<DialSender>,
}

impl<E: FrameEncoder> VideoPublisher<E> {
    pub fn new(
        config: VideoConfig,
        encoder: E,
        cipher: Option<Arc<dyn Cipher>>,
        state: Arc<LinkState>,
    ) -> Self {
        Self {
            config,
            encoder,
            cipher,
            state,
            frames: Arc::new(SlotQueue::new(true)),
            sender: None,
        }
    }

    /// The queue a capture task pushes frames into.
    pub fn frames(&self) -> Arc<SlotQueue<Frame>> {
        Arc::clone(&self.frames)
    }

    /// Drives a [`FrameSource`] into a frame queue until shutdown.
    ///
    /// Runs as its own task so a blocking-slow camera can't stall the
    /// publish loop; the conflating queue absorbs any rate mismatch.
    pub async fn capture<S: FrameSource>(
        mut source: S,
        frames: Arc<SlotQueue<Frame>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                result = source.next_frame() => match result {
                    Ok(frame) => frames.push(frame),
                    Err(e) => {
                        tracing::warn!(error = %e, "frame capture failed");
                        tokio::time::sleep(CAPTURE_RETRY).await;
                    }
                },
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("capture loop stopped");
    }

    /// Runs the publish loop until shutdown.
    pub async fn run(mut self) {
        let mut shutdown = self.state.shutdown_signal();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            if self.state.take_video_restart() {
                tracing::info!("recycling video socket on request");
                self.recycle().await;
            }
            let Some(peer) = self.state.wait_for_peer().await else {
                break;
            };

            let frame = tokio::select! {
                frame = self.frames.pull() => frame,
                _ = shutdown.changed() => continue,
            };

            let bytes = match self.prepare(&frame) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "frame dropped, not encodable");
                    continue;
                }
            };

            if self.sender.is_none() {
                let addr = format!("{peer}:{}", self.config.video_port);
                match DialSender::connect(
                    &addr,
                    self.config.connect_timeout,
                    self.config.send_timeout,
                )
                .await
                {
                    Ok(sender) => self.sender = Some(sender),
                    Err(e) => {
                        tracing::warn!(%addr, error = %e, "video dial failed");
                        self.state.set_connected(false);
                        self.backoff().await;
                        continue;
                    }
                }
            }

            let Some(sender) = self.sender.as_mut() else {
                continue;
            };
            match sender.send(bytes).await {
                Ok(()) => self.state.set_connected(true),
                Err(e) => {
                    tracing::warn!(error = %e, "frame send failed, recycling socket");
                    self.state.set_connected(false);
                    self.recycle().await;
                    self.backoff().await;
                }
            }
        }

        tracing::info!("video publish loop stopped");
        self.recycle().await;
    }

    /// Encoder, optional cipher, then the tagged wire layout.
    fn prepare(&self, frame: &Frame) -> Result<Vec<u8>, VideoError> {
        let mut payload = self.encoder.encode(frame)?;
        if let Some(cipher) = &self.cipher {
            payload = cipher.encrypt(&payload);
        }
        let wire = VideoFrame::new(&self.config.hostname, payload);
        Ok(wire.to_bytes()?)
    }

    /// Drops the current socket, if any.
    async fn recycle(&mut self) {
        if let Some(sender) = self.sender.take() {
            sender.close().await;
        }
    }

    /// Base delay plus jitter.
    async fn backoff(&self) {
        let jitter_ms = self.config.reconnect_jitter.as_millis() as u64;
        let jitter = rand::rng().random_range(0..=jitter_ms);
        tokio::time::sleep(
            self.config.reconnect_delay + Duration::from_millis(jitter),
        )
        .await;
    }
}

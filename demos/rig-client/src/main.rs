//! Demo rig: a full Riglink client with no hardware attached.
//!
//! Runs a [`NullDevice`] and publishes a synthetic test pattern, so a
//! controller can exercise discovery, commands, and video against a
//! plain laptop. Stop with Ctrl-C or a `DESTROY` command.

use std::time::Duration;

use riglink::prelude::*;

/// A moving grayscale gradient, ~10 frames per second.
struct TestPattern {
    width: usize,
    height: usize,
    phase: u8,
}

impl TestPattern {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            phase: 0,
        }
    }
}

impl FrameSource for TestPattern {
    async fn next_frame(&mut self) -> Result<Frame, VideoError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.phase = self.phase.wrapping_add(1);

        let mut bytes = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                bytes.push((x as u8)
                    .wrapping_add(y as u8)
                    .wrapping_add(self.phase));
            }
        }
        Ok(Frame::raw(bytes))
    }
}

#[tokio::main]
async fn main() -> Result<(), RiglinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let client = ClientBuilder::new()
        .config(ClientConfig::default())
        .on_connect(|addr| tracing::info!(%addr, "controller attached"))
        .start(NullDevice, TestPattern::new(64, 48), PassthroughEncoder)
        .await?;

    tracing::info!("demo rig up, waiting for a controller");

    tokio::select! {
        peer = client.wait_ready() => {
            if let Some(peer) = peer {
                tracing::info!(%peer, "rig started");
            }
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupted before any controller arrived");
            client.shutdown();
        }
    }

    tokio::select! {
        _ = client.run() => {
            tracing::info!("shutdown requested over the wire");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupted, shutting down");
            client.shutdown();
        }
    }

    client.finish().await;
    Ok(())
}

//! # Riglink
//!
//! Resilient multi-channel field client for camera and servo rigs.
//!
//! Riglink keeps an unattended rig reachable: a controller discovers
//! the client with one TCP handshake, then drives it over a command
//! channel, reads it over a status channel, and watches it over a
//! video stream. Every channel heals itself — endpoints are dropped
//! and rebound on failure, never repaired in place — so a flaky
//! network degrades the link instead of killing the client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riglink::prelude::*;
//!
//! // Implement Device for your rig and FrameSource for your camera,
//! // then:
//! // let client = ClientBuilder::new()
//! //     .config(ClientConfig::default())
//! //     .start(my_device, my_camera, PassthroughEncoder)
//! //     .await?;
//! // client.run().await;
//! // client.finish().await;
//! ```

mod client;
mod config;
mod discovery;
mod error;

pub use client::{Client, ClientBuilder, ClientPorts};
pub use config::ClientConfig;
pub use error::RiglinkError;

pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ClientPorts, RiglinkError,
    };
    pub use riglink_channel::{ControlInjector, LinkState};
    pub use riglink_device::{Device, DeviceError, NullDevice};
    pub use riglink_protocol::{Cipher, Envelope, Kind};
    pub use riglink_video::{
        Frame, FrameEncoder, FrameSource, PassthroughEncoder, PixelFormat,
        VideoError,
    };
}

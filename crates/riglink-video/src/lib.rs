//! Video publishing for Riglink.
//!
//! This crate owns the outbound video pipeline:
//!
//! 1. **Frames** ([`Frame`], [`FrameSource`], [`FrameEncoder`]) — how
//!    pixels get captured and turned into payload bytes
//! 2. **The publisher** ([`VideoPublisher`]) — dials the controller's
//!    video sink and ships the latest frame, re-dialing with jittered
//!    backoff whenever the link drops
//!
//! The publisher is the client's connectivity probe: a frame that
//! lands marks the link connected, a frame that fails marks it
//! disconnected. That keeps liveness keyed to the one channel that is
//! always busy.

mod error;
mod frame;
mod publisher;

pub use error::VideoError;
pub use frame::{Frame, FrameEncoder, FrameSource, PassthroughEncoder, PixelFormat};
pub use publisher::{VideoConfig, VideoPublisher};

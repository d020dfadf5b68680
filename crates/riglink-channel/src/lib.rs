//! Command and status channels for Riglink.
//!
//! This crate ties the transport endpoints to the protocol and the
//! device:
//!
//! 1. **Shared state** ([`LinkState`]) — controller address, connected
//!    flag, restart and shutdown signals, shared by every task
//! 2. **Control queue** ([`ControlInjector`]) — how other tasks post
//!    messages into the dispatch loop without owning a socket
//! 3. **The manager** ([`ChannelManager`]) — binds the status/command
//!    endpoint pair, dispatches inbound traffic, and rebinds itself
//!    when an endpoint dies
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)  ← wires discovery, video, and this together
//!     ↕
//! Channel Layer (this crate)  ← dispatch loop and self-healing
//!     ↕
//! Transport Layer (below)  ← push/pull endpoints, raw bytes
//! ```

mod control;
mod dispatch;
mod error;
mod manager;
mod state;

pub use control::ControlInjector;
pub use error::ChannelError;
pub use manager::{ChannelConfig, ChannelManager};
pub use state::LinkState;

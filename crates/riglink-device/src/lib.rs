//! Device abstraction for Riglink.
//!
//! This crate defines the boundary between the communication core and
//! whatever hardware a rig actually carries:
//!
//! 1. **The trait** — [`Device`], the capability set the channel layer
//!    drives (commands in, status out, start/stop lifecycle)
//! 2. **A stand-in** — [`NullDevice`], for demos and hardware-free
//!    test runs
//!
//! # How it fits in the stack
//!
//! ```text
//! Channel Layer (above)  ← relays controller commands into the device
//!     ↕
//! Device Layer (this crate)  ← one trait, many hardware backends
//!     ↕
//! Hardware (below)  ← serial servos, GPIO, simulators
//! ```

mod device;
mod error;

pub use device::{Device, NullDevice};
pub use error::DeviceError;

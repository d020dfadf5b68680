//! The device hook: where relayed commands leave the communication
//! core.
//!
//! Riglink doesn't actuate servos or toggle GPIO pins itself — that's
//! the job of a [`Device`] implementation (serial-attached
//! microcontroller, on-board GPIO, a simulator in tests). The
//! communication core picks one implementation at startup and only
//! ever talks through this trait; it never branches on what kind of
//! device is behind it.

use crate::DeviceError;

/// A controllable rig device.
///
/// `Send + Sync + 'static` because the device handle is shared across
/// the channel and status tasks for the life of the client.
pub trait Device: Send + Sync + 'static {
    /// Forwards one command string, verbatim, to the hardware.
    ///
    /// Called for every non-reserved command the controller sends.
    /// The command has already been acknowledged on the status channel
    /// by the time this runs; errors are logged, not retried.
    fn send_command(
        &self,
        command: &str,
    ) -> impl std::future::Future<Output = Result<(), DeviceError>> + Send;

    /// Reports the device's current status line.
    ///
    /// Polled periodically when status push is enabled, and relayed to
    /// the controller over the status channel.
    fn status(
        &self,
    ) -> impl std::future::Future<Output = Result<String, DeviceError>> + Send;

    /// Brings the device up. Called once, after the controller's
    /// address is known.
    fn start(
        &self,
    ) -> impl std::future::Future<Output = Result<(), DeviceError>> + Send;

    /// Shuts the device down. Called once during client shutdown.
    fn stop(
        &self,
    ) -> impl std::future::Future<Output = Result<(), DeviceError>> + Send;
}

/// A [`Device`] that accepts everything and drives nothing.
///
/// Useful for demos and for running the communication core on a bench
/// machine with no rig attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl Device for NullDevice {
    async fn send_command(&self, command: &str) -> Result<(), DeviceError> {
        tracing::debug!(command, "null device swallowed command");
        Ok(())
    }

    async fn status(&self) -> Result<String, DeviceError> {
        Ok("READY".to_string())
    }

    async fn start(&self) -> Result<(), DeviceError> {
        tracing::info!("null device started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        tracing::info!("null device stopped");
        Ok(())
    }
}

//! Shared link state: who the controller is, whether it considers us
//! connected, and the cross-task restart/shutdown flags.
//!
//! One `Arc<LinkState>` is handed to every long-lived task at startup.
//! Tasks communicate through it instead of holding references to each
//! other, so any one of them can be restarted without re-wiring the
//! rest.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Cross-task link state for one client instance.
pub struct LinkState {
    /// Controller address, set by the discovery handshake. Tasks that
    /// can't proceed without a controller wait on this.
    peer: watch::Sender<Option<IpAddr>>,

    /// Whether the controller currently considers us attached. Written
    /// by the video publisher (on send outcome) and by a DISCONNECT
    /// command; read by anyone who wants a health signal.
    connected: AtomicBool,

    /// Latched request for the video publisher to recycle its socket.
    video_restart: AtomicBool,

    /// Flips to true exactly once; every loop observes it and winds
    /// down.
    shutdown: watch::Sender<bool>,
}

impl LinkState {
    pub fn new() -> Self {
        Self {
            peer: watch::Sender::new(None),
            connected: AtomicBool::new(false),
            video_restart: AtomicBool::new(false),
            shutdown: watch::Sender::new(false),
        }
    }

    // --- peer ---

    /// Records the controller's address (discovery handshake accepted).
    pub fn set_peer(&self, addr: IpAddr) {
        self.peer.send_replace(Some(addr));
    }

    /// The current controller address, if one has connected.
    pub fn peer(&self) -> Option<IpAddr> {
        *self.peer.borrow()
    }

    /// Waits until a controller address is known, returning it.
    /// Returns `None` if shutdown begins first.
    pub async fn wait_for_peer(&self) -> Option<IpAddr> {
        let mut peer_rx = self.peer.subscribe();
        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            if let Some(addr) = *peer_rx.borrow_and_update() {
                return Some(addr);
            }
            if *shutdown_rx.borrow_and_update() {
                return None;
            }
            tokio::select! {
                changed = peer_rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                _ = shutdown_rx.changed() => {}
            }
        }
    }

    // --- connected ---

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    // --- video restart ---

    /// Asks the video publisher to drop and re-dial its socket.
    pub fn request_video_restart(&self) {
        self.video_restart.store(true, Ordering::Release);
    }

    /// Consumes a pending video restart request, if any.
    pub fn take_video_restart(&self) -> bool {
        self.video_restart.swap(false, Ordering::AcqRel)
    }

    // --- shutdown ---

    /// Starts the one-way wind-down. Idempotent.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// A receiver that resolves once shutdown begins. Each task holds
    /// its own copy and selects on it.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Waits until shutdown begins.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

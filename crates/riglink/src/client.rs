//! `Client` builder and lifecycle.
//!
//! This is the entry point for running a Riglink field client. It ties
//! together all the layers: transport → protocol → channel → device,
//! plus the discovery listener and the video publisher.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use riglink_channel::{ChannelManager, ControlInjector, LinkState};
use riglink_device::Device;
use riglink_protocol::{Cipher, JsonCodec, SealedCodec};
use riglink_video::{FrameEncoder, FrameSource, VideoPublisher};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::discovery::{DiscoveryListener, OnConnect};
use crate::RiglinkError;

/// How long `finish` waits for each task to wind down before aborting
/// it.
const JOIN_GRACE: Duration = Duration::from_secs(5);

/// The ports a started client actually occupies. Matters when the
/// config asked for ephemeral ports.
#[derive(Debug, Clone, Copy)]
pub struct ClientPorts {
    pub discovery: u16,
    pub status: u16,
    pub command: u16,
}

/// Builder for configuring and starting a Riglink client.
///
/// # Example
///
/// ```rust,ignore
/// use riglink::prelude::*;
///
/// let client = ClientBuilder::new()
///     .config(my_config)
///     .start(my_device, my_camera, PassthroughEncoder)
///     .await?;
/// client.run().await;
/// client.finish().await;
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    data_cipher: Option<Arc<dyn Cipher>>,
    video_cipher: Option<Arc<dyn Cipher>>,
    on_connect: Option<OnConnect>,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            data_cipher: None,
            video_cipher: None,
            on_connect: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Encrypts discovery, command, and status traffic.
    pub fn data_cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.data_cipher = Some(cipher);
        self
    }

    /// Encrypts video frame payloads.
    pub fn video_cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.video_cipher = Some(cipher);
        self
    }

    /// Called each time a controller completes the discovery handshake.
    pub fn on_connect(
        mut self,
        hook: impl Fn(IpAddr) + Send + Sync + 'static,
    ) -> Self {
        self.on_connect = Some(Arc::new(hook));
        self
    }

    /// Binds every listener and spawns the client's tasks.
    ///
    /// Returns once the client is discoverable; the controller shows
    /// up whenever it shows up.
    ///
    /// # Errors
    /// Fails only on the initial binds — after that, every failure is
    /// handled by the self-healing loops.
    pub async fn start<D, S, E>(
        self,
        device: D,
        source: S,
        encoder: E,
    ) -> Result<Client<D>, RiglinkError>
    where
        D: Device,
        S: FrameSource,
        E: FrameEncoder,
    {
        let config = self.config;
        let state = Arc::new(LinkState::new());
        let device = Arc::new(device);
        let data_codec =
            SealedCodec::new(JsonCodec, self.data_cipher.clone());

        // --- Command/status channel pair ---
        let (mut manager, injector) = ChannelManager::new(
            config.channel_config(),
            data_codec.clone(),
            Arc::clone(&device),
            Arc::clone(&state),
        );
        manager.bind().await?;
        let (status_port, command_port) = manager
            .bound_ports()
            .ok_or(riglink_channel::ChannelError::NotBound("channel pair"))?;

        // --- Discovery listener ---
        let discovery = DiscoveryListener::bind(
            format!("{}:{}", config.bind_ip, config.conn_port),
            config.hostname.clone(),
            data_codec,
            Arc::clone(&state),
            injector.clone(),
            self.on_connect,
        )
        .await?;
        let discovery_port = discovery.local_port()?;

        // --- Video publisher ---
        let publisher = VideoPublisher::new(
            config.video_config(),
            encoder,
            self.video_cipher,
            Arc::clone(&state),
        );
        let frames = publisher.frames();

        let mut tasks = vec![
            tokio::spawn(manager.run()),
            tokio::spawn(discovery.run()),
            tokio::spawn(publisher.run()),
            tokio::spawn(VideoPublisher::<E>::capture(
                source,
                frames,
                state.shutdown_signal(),
            )),
        ];

        // The device comes up once a controller has claimed the rig.
        tasks.push(tokio::spawn(device_startup(
            Arc::clone(&device),
            Arc::clone(&state),
        )));

        if let Some(interval) = config.status_interval {
            tasks.push(tokio::spawn(status_loop(
                Arc::clone(&device),
                Arc::clone(&state),
                injector.clone(),
                interval,
            )));
        }

        tracing::info!(
            hostname = %config.hostname,
            discovery_port,
            command_port,
            status_port,
            "client started"
        );

        Ok(Client {
            state,
            device,
            injector,
            ports: ClientPorts {
                discovery: discovery_port,
                status: status_port,
                command: command_port,
            },
            tasks,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Riglink client.
///
/// All the work happens on spawned tasks; this handle observes and
/// controls them.
pub struct Client<D: Device> {
    state: Arc<LinkState>,
    device: Arc<D>,
    injector: ControlInjector,
    ports: ClientPorts,
    tasks: Vec<JoinHandle<()>>,
}

impl<D: Device> Client<D> {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The ports this client actually bound.
    pub fn ports(&self) -> ClientPorts {
        self.ports
    }

    /// The controller's address, once one has completed discovery.
    pub fn peer(&self) -> Option<IpAddr> {
        self.state.peer()
    }

    /// Whether the controller currently considers us attached.
    pub fn connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Waits until a controller has claimed this rig. Returns the
    /// controller's address, or `None` if shutdown begins first.
    pub async fn wait_ready(&self) -> Option<IpAddr> {
        self.state.wait_for_peer().await
    }

    /// A handle for posting control messages into the dispatch loop.
    pub fn control(&self) -> ControlInjector {
        self.injector.clone()
    }

    /// Requests shutdown. Idempotent; `run` and `finish` observe it.
    pub fn shutdown(&self) {
        self.state.begin_shutdown();
    }

    /// Waits until shutdown is requested, from anywhere: a `DESTROY`
    /// command, a signal handler calling [`Client::shutdown`], or a
    /// task deciding the client is done.
    pub async fn run(&self) {
        self.state.wait_for_shutdown().await;
    }

    /// Stops the device, then winds every task down with a bounded
    /// wait. Tasks that outstay the grace period are aborted.
    pub async fn finish(mut self) {
        self.state.begin_shutdown();
        if let Err(e) = self.device.stop().await {
            tracing::warn!(error = %e, "device stop failed");
        }
        for mut task in self.tasks.drain(..) {
            if tokio::time::timeout(JOIN_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
        tracing::info!("client stopped");
    }
}

/// Waits for the first controller, then brings the device up.
async fn device_startup<D: Device>(device: Arc<D>, state: Arc<LinkState>) {
    if state.wait_for_peer().await.is_none() {
        return;
    }
    if let Err(e) = device.start().await {
        tracing::warn!(error = %e, "device start failed");
    }
}

/// Pushes the device's status line to the controller on an interval.
///
/// Goes through the control queue, so status lines ride the same
/// dispatch path (and the same cipher) as every other status message.
async fn status_loop<D: Device>(
    device: Arc<D>,
    state: Arc<LinkState>,
    injector: ControlInjector,
    interval: Duration,
) {
    let mut shutdown = state.shutdown_signal();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                if state.peer().is_none() {
                    continue;
                }
                match device.status().await {
                    Ok(status) => injector.post(status),
                    Err(e) => {
                        tracing::warn!(error = %e, "status poll failed");
                    }
                }
            }
            _ = shutdown.changed() => {}
        }
    }
    tracing::info!("status loop stopped");
}

//! Client configuration.
//!
//! Built once, before anything starts, and never mutated afterwards —
//! every task gets its slice of the config by value at spawn time.

use std::net::IpAddr;
use std::time::Duration;

use riglink_channel::ChannelConfig;
use riglink_transport::EndpointOptions;
use riglink_video::VideoConfig;

/// Everything a [`Client`](crate::Client) needs to come up.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Local interface for every listener.
    pub bind_ip: IpAddr,
    /// Discovery (handshake) listener port. `0` picks an ephemeral
    /// port.
    pub conn_port: u16,
    /// Inbound command port.
    pub data_port: u16,
    /// Outbound status/response port.
    pub status_port: u16,
    /// Port the controller's video sink listens on.
    pub video_port: u16,
    /// This rig's name, sent in the discovery reply and stamped on
    /// every video frame.
    pub hostname: String,
    /// Queue behavior for the command/status endpoints.
    pub options: EndpointOptions,
    /// Pause before rebinding restarted channel endpoints.
    pub settle_delay: Duration,
    /// Bound on dialing the video sink.
    pub connect_timeout: Duration,
    /// Bound on each video frame send.
    pub send_timeout: Duration,
    /// Base pause before the video publisher re-dials.
    pub reconnect_delay: Duration,
    /// Random extra pause on top of `reconnect_delay`.
    pub reconnect_jitter: Duration,
    /// When set, the device's status line is pushed to the controller
    /// at this interval. Off by default — most controllers poll.
    pub status_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::from([0, 0, 0, 0]),
            conn_port: 6667,
            data_port: 6666,
            status_port: 6668,
            video_port: 5555,
            hostname: default_hostname(),
            options: EndpointOptions::default(),
            settle_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(2),
            send_timeout: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(1),
            reconnect_jitter: Duration::from_millis(500),
            status_interval: None,
        }
    }
}

impl ClientConfig {
    pub(crate) fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            bind_ip: self.bind_ip,
            status_port: self.status_port,
            data_port: self.data_port,
            options: self.options,
            settle_delay: self.settle_delay,
        }
    }

    pub(crate) fn video_config(&self) -> VideoConfig {
        VideoConfig {
            video_port: self.video_port,
            hostname: self.hostname.clone(),
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            reconnect_delay: self.reconnect_delay,
            reconnect_jitter: self.reconnect_jitter,
        }
    }
}

/// The machine's hostname, falling back to a fixed name when the
/// environment doesn't provide one.
fn default_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "riglink".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_match_controller_convention() {
        let config = ClientConfig::default();
        assert_eq!(config.conn_port, 6667);
        assert_eq!(config.data_port, 6666);
        assert_eq!(config.status_port, 6668);
        assert_eq!(config.video_port, 5555);
    }

    #[test]
    fn test_derived_configs_carry_ports() {
        let config = ClientConfig::default();
        let channel = config.channel_config();
        assert_eq!(channel.status_port, config.status_port);
        assert_eq!(channel.data_port, config.data_port);
        let video = config.video_config();
        assert_eq!(video.video_port, config.video_port);
        assert_eq!(video.hostname, config.hostname);
    }
}

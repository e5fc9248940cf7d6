use std::{net::SocketAddr, time::Duration};

use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GoProConfig {
    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub listener: ListenerConfig,
}

/// Settings for the camera's HTTP control API.
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Port that the camera serves its control API on.
    #[serde(default = "default_control_port")]
    pub port: u16,

    /// Hard ceiling on each control request, in milliseconds. Requests are
    /// never retried.
    #[serde(default = "default_request_timeout", with = "serde_millis")]
    pub request_timeout: Duration,
}

/// Settings for the UDP listener that receives the transport stream.
#[derive(Clone, Debug, Deserialize)]
pub struct ListenerConfig {
    /// Local address to bind. The camera always sends to port 8554.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// If no datagram arrives within this many milliseconds, the session ends.
    #[serde(default = "default_idle_timeout", with = "serde_millis")]
    pub idle_timeout: Duration,

    /// Number of undelivered datagrams to buffer before the receiver stalls.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_control_port() -> u16 {
    8080
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8554))
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            port: default_control_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            idle_timeout: default_idle_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

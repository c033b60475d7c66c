//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the backend connection pool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Target host: a literal IP address or a domain name.
    pub target_host: String,

    /// Target port on every backend.
    pub target_port: u16,

    /// DNS refresh and balancing settings (domain targets only).
    pub dns: DnsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Shorthand for a target with every other setting defaulted.
    pub fn for_target(host: impl Into<String>, port: u16) -> Self {
        Self {
            target_host: host.into(),
            target_port: port,
            ..Self::default()
        }
    }
}

/// DNS refresh and load balancing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Re-resolution interval in seconds.
    pub refresh_rate_secs: u64,

    /// Watch the domain for changes after the initial resolution.
    pub need_refresh: bool,

    /// Balancing algorithm: none, round_robin or random.
    pub balancer: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            refresh_rate_secs: 60,
            need_refresh: true,
            balancer: "round_robin".to_string(),
        }
    }
}

impl DnsConfig {
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_secs(self.refresh_rate_secs)
    }
}

/// Timeout configuration for backend connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Dial + HTTP/2 handshake timeout in seconds (0 disables).
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 5 }
    }
}

impl TimeoutConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_secs > 0).then(|| Duration::from_secs(self.connect_secs))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Discovery listener.
    pub listener: ListenerConfig,

    /// Resource directories and hot reload.
    pub sources: SourcesConfig,

    /// Session grouping and push policy.
    pub distribution: DistributionConfig,

    pub lifecycle: LifecycleConfig,

    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

/// Discovery listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:18000").
    pub bind_address: String,

    /// Maximum concurrent subscriber sessions.
    pub max_sessions: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:18000".to_string(),
            max_sessions: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directories scanned for resource files, in order.
    pub directories: Vec<PathBuf>,

    /// Reconcile on filesystem changes.
    pub watch: bool,

    /// File events within this window collapse into one reconcile.
    pub debounce_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            directories: vec![PathBuf::from(".")],
            watch: false,
            debounce_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DistributionConfig {
    /// Store key the reconciler commits to and sessions read from.
    pub group_key: String,

    /// Skip pushes whose content equals what the subscriber last received.
    pub suppress_identical_pushes: bool,

    /// Outbound messages buffered per session.
    pub send_buffer: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            group_key: "default".to_string(),
            suppress_identical_pushes: true,
            send_buffer: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    pub pid_file: PathBuf,

    /// How long shutdown waits for sessions to close.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from("config-plane.pid"),
            shutdown_grace_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Serve Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:18001".to_string(),
        }
    }
}

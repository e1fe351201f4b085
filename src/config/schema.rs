//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::net::BindTarget;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 8488;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VelariumConfig {
    /// Listener and HTTP settings.
    pub server: ServerConfig,

    /// Conversational agent settings.
    pub agent: AgentConfig,

    /// Session store settings.
    pub sessions: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener and HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind when no socket path is set.
    pub host: String,

    /// Port to bind when no socket path is set.
    pub port: u16,

    /// Unix domain socket path. Takes precedence over host and port.
    pub socket: Option<PathBuf>,

    /// Optional TLS configuration (TCP only).
    pub tls: Option<TlsConfig>,

    /// Honor X-Forwarded-For from a reverse proxy.
    pub trust_proxy_headers: bool,

    /// Header carrying the client-facing scheme.
    pub forwarded_proto_header: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Expose interactive API documentation.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            socket: None,
            tls: None,
            trust_proxy_headers: true,
            forwarded_proto_header: "x-forwarded-proto".to_string(),
            request_timeout_secs: 60,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Resolve the listening endpoint. A socket path wins over host and port.
    pub fn bind_target(&self) -> BindTarget {
        match &self.socket {
            Some(path) => BindTarget::Unix(path.clone()),
            None => BindTarget::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Agent configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Display name reported by the agent.
    pub name: String,

    /// Optional persona file read at startup. A missing file is fatal.
    pub persona_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "velarium".to_string(),
            persona_path: None,
        }
    }
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding session documents.
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/sessions"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

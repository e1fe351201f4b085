//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, header names parse)
//! - Detect conflicting listener settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: VelariumConfig → Result<(), Vec<ValidationError>>

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::VelariumConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.host must not be empty when no socket is configured")]
    EmptyHost,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.forwarded_proto_header {0:?} is not a valid header name")]
    InvalidHeaderName(String),

    #[error("server.tls cannot be combined with server.socket")]
    TlsOnSocket,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &VelariumConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.socket.is_none() && server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if HeaderName::from_bytes(server.forwarded_proto_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            server.forwarded_proto_header.clone(),
        ));
    }
    if server.socket.is_some() && server.tls.is_some() {
        errors.push(ValidationError::TlsOnSocket);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

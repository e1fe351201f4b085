//! Per-request attributes and their extractors.
//!
//! # Responsibilities
//! - Carry the effective scheme (`RequestScheme`) through request extensions
//! - Build absolute URLs from scheme and host (`BaseUrl`)
//! - Resolve the client address (`ClientAddr`)
//!
//! # Design Decisions
//! - The runner seeds the native scheme; filters may overwrite it
//! - Extractors never reject; missing attributes fall back to connection facts

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts};

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Scheme (`http`/`https`) under which the client reached the service.
///
/// Stored as given: a forwarded value is not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScheme(String);

impl RequestScheme {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self(scheme.into())
    }

    pub fn http() -> Self {
        Self::new("http")
    }

    pub fn https() -> Self {
        Self::new("https")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for RequestScheme
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestScheme>()
            .cloned()
            .unwrap_or_else(RequestScheme::http))
    }
}

/// `scheme://host` of the current request, for building absolute links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    scheme: RequestScheme,
    host: String,
}

impl BaseUrl {
    pub fn new(scheme: RequestScheme, host: impl Into<String>) -> Self {
        Self {
            scheme,
            host: host.into(),
        }
    }

    pub fn scheme(&self) -> &RequestScheme {
        &self.scheme
    }

    /// Absolute URL for an absolute path.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self, path)
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let scheme = RequestScheme::from_request_parts(parts, state).await?;
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        Ok(BaseUrl::new(scheme, host))
    }
}

/// Address of the originating client, if known.
///
/// Set from `X-Forwarded-For` when proxy headers are trusted, otherwise
/// from the TCP peer. Unix socket peers have no address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(addr) = parts.extensions.get::<ClientAddr>() {
            return Ok(*addr);
        }
        Ok(ClientAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

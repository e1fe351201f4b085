//! Scheme normalization behind TLS-terminating proxies.

use axum::{
    extract::Request,
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;

use crate::config::ServerConfig;
use crate::http::middleware::RequestFilter;
use crate::http::request::RequestScheme;

/// Overwrites the effective scheme with the forwarded-proto header value.
///
/// An absent or empty header leaves the scheme untouched. Values are copied
/// verbatim; this filter never rejects a request.
#[derive(Debug, Clone)]
pub struct SchemeNormalizer {
    header: HeaderName,
}

impl SchemeNormalizer {
    /// Normalizer reading `X-Forwarded-Proto`.
    pub fn new() -> Self {
        Self::with_header(HeaderName::from_static("x-forwarded-proto"))
    }

    pub fn with_header(header: HeaderName) -> Self {
        Self { header }
    }

    /// Uses the configured header, falling back to `X-Forwarded-Proto` if it
    /// does not parse (validation rejects that case at load time).
    pub fn from_config(config: &ServerConfig) -> Self {
        HeaderName::from_bytes(config.forwarded_proto_header.as_bytes())
            .map(Self::with_header)
            .unwrap_or_else(|_| Self::new())
    }

    /// Apply the header to `request` in place.
    pub fn normalize(&self, request: &mut Request) {
        let forwarded = request
            .headers()
            .get(&self.header)
            .filter(|value| !value.is_empty())
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        if let Some(scheme) = forwarded {
            tracing::trace!(scheme = %scheme, "Scheme taken from forwarded header");
            request.extensions_mut().insert(RequestScheme::new(scheme));
        }
    }
}

impl Default for SchemeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestFilter for SchemeNormalizer {
    fn name(&self) -> &'static str {
        "scheme-normalizer"
    }

    fn process<'a>(&'a self, mut request: Request, next: Next) -> BoxFuture<'a, Response> {
        self.normalize(&mut request);
        Box::pin(next.run(request))
    }
}

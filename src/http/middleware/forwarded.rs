//! Client address resolution from proxy headers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;

use crate::http::middleware::RequestFilter;
use crate::http::request::ClientAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Records the originating client from `X-Forwarded-For`.
///
/// Only installed when the deployment trusts its reverse proxy. The first
/// entry of the header is the original client; unparsable values fall back
/// to the TCP peer.
#[derive(Debug, Clone, Default)]
pub struct ForwardedClient;

impl ForwardedClient {
    pub fn new() -> Self {
        Self
    }

    /// First parsable address in `X-Forwarded-For`.
    pub fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
        let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
        let first = value.split(',').next()?.trim();
        first
            .parse::<IpAddr>()
            .ok()
            .or_else(|| first.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
    }
}

impl RequestFilter for ForwardedClient {
    fn name(&self) -> &'static str {
        "forwarded-client"
    }

    fn process<'a>(&'a self, mut request: Request, next: Next) -> BoxFuture<'a, Response> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client = Self::forwarded_for(request.headers()).or(peer);
        request.extensions_mut().insert(ClientAddr(client));
        Box::pin(next.run(request))
    }
}

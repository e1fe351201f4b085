//! Per-request metrics recording.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use futures_util::future::BoxFuture;

use crate::http::middleware::RequestFilter;
use crate::observability::metrics;

/// Counts requests and their latency by method and status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMetrics;

impl RequestFilter for RequestMetrics {
    fn name(&self) -> &'static str {
        "request-metrics"
    }

    fn process<'a>(&'a self, request: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let response = next.run(request).await;
            metrics::record_request(&method, response.status().as_u16(), start);
            response
        })
    }
}

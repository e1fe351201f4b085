//! Request filters and their explicit composition.
//!
//! # Data Flow
//! ```text
//! request
//!     → filter[0].process(request, next)   (SchemeNormalizer, always first)
//!     → filter[1].process(request, next)   (ForwardedClient, when trusted)
//!     → filter[2].process(request, next)   (RequestMetrics)
//!     → routed handler
//! ```
//!
//! # Design Decisions
//! - Order lives in one `FilterChain` value, not in layer registration order
//! - Filters share one contract: `process(request, next) -> response`
//! - The chain wraps routes, so it is applied after route registration

pub mod forwarded;
pub mod request_metrics;
pub mod scheme;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use futures_util::future::BoxFuture;

use crate::config::ServerConfig;

pub use forwarded::ForwardedClient;
pub use request_metrics::RequestMetrics;
pub use scheme::SchemeNormalizer;

/// One step of request processing.
pub trait RequestFilter: Send + Sync + 'static {
    /// Stable name used in logs and ordering checks.
    fn name(&self) -> &'static str;

    /// Handle `request`, usually by adjusting it and awaiting `next`.
    fn process<'a>(&'a self, request: Request, next: Next) -> BoxFuture<'a, Response>;
}

/// Ordered list of filters; index 0 sees the request first.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain every server runs: scheme first, then client address, then metrics.
    pub fn standard(config: &ServerConfig) -> Self {
        let mut chain = Self::new().with(SchemeNormalizer::from_config(config));
        if config.trust_proxy_headers {
            chain = chain.with(ForwardedClient::new());
        }
        chain.with(RequestMetrics)
    }

    /// Append a filter to the end of the chain.
    pub fn with(mut self, filter: impl RequestFilter) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Wrap every route already registered on `router`.
    ///
    /// Axum runs the most recently added layer first, so filters are layered
    /// in reverse to keep index 0 outermost.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.filters.iter().rev().fold(router, |router, filter| {
            router.layer(middleware::from_fn_with_state(filter.clone(), run_filter))
        })
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

async fn run_filter(
    State(filter): State<Arc<dyn RequestFilter>>,
    request: Request,
    next: Next,
) -> Response {
    filter.process(request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RequestFilter for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(&'a self, request: Request, next: Next) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(self.name);
                next.run(request).await
            })
        }
    }

    #[tokio::test]
    async fn filters_run_in_chain_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = ["first", "second", "third"]
            .into_iter()
            .fold(FilterChain::new(), |chain, name| {
                chain.with(Recorder {
                    name,
                    seen: seen.clone(),
                })
            });

        let app = chain.apply(Router::new().route("/", get(|| async { "ok" })));
        let response = app
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn standard_chain_puts_scheme_first() {
        let mut config = ServerConfig::default();
        assert_eq!(
            FilterChain::standard(&config).names(),
            vec!["scheme-normalizer", "forwarded-client", "request-metrics"]
        );

        config.trust_proxy_headers = false;
        assert_eq!(
            FilterChain::standard(&config).names(),
            vec!["scheme-normalizer", "request-metrics"]
        );
    }
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Listener (TCP / TLS / Unix socket)
//!     → server.rs (native scheme, trace, request id, timeout)
//!     → middleware (filter chain: scheme normalizer first)
//!     → routes.rs (handlers using AppState)
//!     → response.rs (ApiError → JSON)
//!     → Send to client
//! ```

pub mod docs;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use middleware::{FilterChain, RequestFilter, SchemeNormalizer};
pub use request::{BaseUrl, ClientAddr, RequestScheme, X_REQUEST_ID};
pub use response::ApiError;
pub use routes::{DefaultRoutes, RouteConfigurator, RouteOptions};
pub use server::{AppState, BoundServer, ServeError, ServerRunner};

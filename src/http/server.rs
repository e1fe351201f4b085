//! HTTP server setup and the server runner.
//!
//! # Responsibilities
//! - Hold the shared application state injected into handlers
//! - Wrap registered routes in the filter chain and ambient tower layers
//! - Bind the endpoint and drive the server loop until shutdown
//! - Seed each request with the connection's native scheme

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::agent::Agent;
use crate::config::{ServerConfig, TlsConfig};
use crate::http::middleware::FilterChain;
use crate::http::request::RequestScheme;
use crate::http::response::ApiError;
use crate::net::{tls, BindTarget, Listener, ListenerError};
use crate::sessions::{SessionAvailability, SessionStore};

/// How long in-flight TLS connections may drain after shutdown starts.
const TLS_DRAIN: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn Agent>,
    pub sessions: SessionAvailability,
}

impl AppState {
    pub fn new(agent: Arc<dyn Agent>, sessions: SessionAvailability) -> Self {
        Self { agent, sessions }
    }

    /// The session store, or the request-level error used while degraded.
    pub fn session_store(&self) -> Result<&Arc<dyn SessionStore>, ApiError> {
        match &self.sessions {
            SessionAvailability::Ready(store) => Ok(store),
            SessionAvailability::Degraded { reason } => {
                Err(ApiError::SessionsUnavailable(reason.to_string()))
            }
        }
    }
}

/// Wrap the registered routes: filter chain first, then the tower layers.
#[allow(deprecated)]
pub fn assemble(
    routes: Router<AppState>,
    state: AppState,
    chain: &FilterChain,
    config: &ServerConfig,
) -> Router {
    chain
        .apply(routes.with_state(state))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

/// Errors that end the server runner.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("server loop failed: {0}")]
    Io(#[source] std::io::Error),
}

/// Binds the configured endpoint and serves an application on it.
#[derive(Debug, Clone)]
pub struct ServerRunner {
    target: BindTarget,
    tls: Option<TlsConfig>,
}

impl ServerRunner {
    pub fn new(target: BindTarget) -> Self {
        Self { target, tls: None }
    }

    pub fn with_tls(mut self, tls: Option<TlsConfig>) -> Self {
        self.tls = tls;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.bind_target()).with_tls(config.tls.clone())
    }

    pub fn target(&self) -> &BindTarget {
        &self.target
    }

    /// Bind the endpoint without serving yet.
    ///
    /// TLS material is loaded before the socket is bound, so both kinds of
    /// failure surface here rather than once serving has started.
    pub async fn bind(&self) -> Result<BoundServer, ServeError> {
        let endpoint = match (&self.target, &self.tls) {
            (BindTarget::Unix(_), Some(_)) => return Err(ListenerError::TlsOnSocket.into()),
            (BindTarget::Tcp { .. }, Some(tls_config)) => {
                let config = tls::load(tls_config).await?;
                let listener = match Listener::bind(&self.target).await? {
                    Listener::Tcp(listener) => listener.into_std().map_err(ServeError::Io)?,
                    #[cfg(unix)]
                    Listener::Unix(_) => return Err(ListenerError::TlsOnSocket.into()),
                };
                Endpoint::Tls { listener, config }
            }
            (_, None) => Endpoint::Plain(Listener::bind(&self.target).await?),
        };
        Ok(BoundServer { endpoint })
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn run<F>(&self, app: Router, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.bind().await?.serve(app, shutdown).await
    }
}

enum Endpoint {
    Plain(Listener),
    /// Non-blocking std listener, handed to axum-server when serving starts.
    Tls {
        listener: std::net::TcpListener,
        config: RustlsConfig,
    },
}

/// An endpoint ready to serve.
pub struct BoundServer {
    endpoint: Endpoint,
}

impl BoundServer {
    /// Local TCP address, `None` for sockets.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.endpoint {
            Endpoint::Plain(listener) => listener.local_addr(),
            Endpoint::Tls { listener, .. } => listener.local_addr().ok(),
        }
    }

    /// Scheme requests arrive with before any forwarded header is applied.
    pub fn native_scheme(&self) -> RequestScheme {
        match &self.endpoint {
            Endpoint::Plain(_) => RequestScheme::http(),
            Endpoint::Tls { .. } => RequestScheme::https(),
        }
    }

    fn describe(&self) -> String {
        match &self.endpoint {
            Endpoint::Plain(listener) => listener.describe(),
            Endpoint::Tls { listener, .. } => listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "tls:unknown".to_string()),
        }
    }

    /// Serve `app` until `shutdown` resolves, then drain gracefully.
    pub async fn serve<F>(self, app: Router, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let scheme = self.native_scheme();
        let app = app.layer(Extension(scheme.clone()));

        tracing::info!(endpoint = %self.describe(), scheme = %scheme, "Velarium is ready to use");

        let result = match self.endpoint {
            Endpoint::Plain(Listener::Tcp(listener)) => {
                axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(shutdown)
                .await
            }
            #[cfg(unix)]
            Endpoint::Plain(Listener::Unix(mut socket)) => match socket.take_listener() {
                Some(listener) => {
                    axum::serve(listener, app.into_make_service())
                        .with_graceful_shutdown(shutdown)
                        .await
                }
                None => Ok(()),
            },
            Endpoint::Tls { listener, config } => {
                let handle = axum_server::Handle::new();
                let trigger = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    trigger.graceful_shutdown(Some(TLS_DRAIN));
                });
                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await
            }
        };

        tracing::info!("Stopping Velarium");
        result.map_err(ServeError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tls_on_unix_socket_is_rejected_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velarium.sock");
        let runner = ServerRunner::new(BindTarget::Unix(path.clone())).with_tls(Some(TlsConfig {
            cert_path: "/no/cert.pem".into(),
            key_path: "/no/key.pem".into(),
        }));

        let err = runner.bind().await.err().expect("TLS over a socket must be refused");
        assert!(matches!(err, ServeError::Bind(ListenerError::TlsOnSocket)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_tls_material_fails_at_bind() {
        let runner = ServerRunner::new(BindTarget::Tcp {
            host: "127.0.0.1".into(),
            port: 0,
        })
        .with_tls(Some(TlsConfig {
            cert_path: "/no/cert.pem".into(),
            key_path: "/no/key.pem".into(),
        }));

        let err = runner.bind().await.err().expect("missing certificate must fail");
        assert!(matches!(err, ServeError::Bind(ListenerError::Tls(_))));
    }
}

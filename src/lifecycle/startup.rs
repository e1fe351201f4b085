//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the agent (fatal on failure)
//! - Open the session store (degrade on failure)
//! - Register routes and wrap them in the filter chain
//! - Bind the listener and serve
//!
//! # Design Decisions
//! - Steps run strictly in order, exactly once per sequencer
//! - Progress is published on a watch channel for observers and tests
//! - Listeners start last (traffic only when ready)

use std::future::Future;

use axum::Router;
use thiserror::Error;
use tokio::sync::watch;

use crate::agent::{AgentError, AgentFactory, ConfiguredAgentFactory};
use crate::config::{ServerConfig, VelariumConfig};
use crate::http::middleware::FilterChain;
use crate::http::routes::{DefaultRoutes, RouteConfigurator, RouteOptions};
use crate::http::server::{assemble, AppState, ServeError, ServerRunner};
use crate::observability::metrics;
use crate::sessions::{FileSessionStoreFactory, SessionAvailability, SessionStoreFactory};

/// Remediation shown when the session store cannot be opened.
pub const SESSION_REMEDIATION: &str = "run `velarium migrate` to provision session storage";

/// Where startup currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    NotStarted,
    AgentReady,
    SessionsReady,
    SessionsDegraded,
    RoutesRegistered,
    Serving,
    Stopped,
}

impl StartupPhase {
    pub fn ordinal(self) -> u8 {
        match self {
            StartupPhase::NotStarted => 0,
            StartupPhase::AgentReady => 1,
            StartupPhase::SessionsReady | StartupPhase::SessionsDegraded => 2,
            StartupPhase::RoutesRegistered => 3,
            StartupPhase::Serving => 4,
            StartupPhase::Stopped => 5,
        }
    }
}

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Serve(#[from] ServeError),

    #[error("startup already ran (phase {0:?})")]
    AlreadyStarted(StartupPhase),
}

/// Output of steps 1-3: a fully configured application, not yet serving.
pub struct PreparedApp {
    pub router: Router,
    pub state: AppState,
    pub filters: FilterChain,
}

/// Runs initialization in order and hands the application to the runner.
pub struct StartupSequencer {
    config: ServerConfig,
    agent_factory: Box<dyn AgentFactory>,
    session_factory: Box<dyn SessionStoreFactory>,
    routes: Box<dyn RouteConfigurator>,
    filters: FilterChain,
    phase: watch::Sender<StartupPhase>,
}

impl StartupSequencer {
    pub fn new(
        config: ServerConfig,
        agent_factory: impl AgentFactory + 'static,
        session_factory: impl SessionStoreFactory + 'static,
    ) -> Self {
        let filters = FilterChain::standard(&config);
        let (phase, _) = watch::channel(StartupPhase::NotStarted);
        Self {
            config,
            agent_factory: Box::new(agent_factory),
            session_factory: Box::new(session_factory),
            routes: Box::new(DefaultRoutes),
            filters,
            phase,
        }
    }

    /// Sequencer wired with the built-in agent and file session store.
    pub fn from_config(config: &VelariumConfig) -> Self {
        Self::new(
            config.server.clone(),
            ConfiguredAgentFactory::new(config.agent.clone()),
            FileSessionStoreFactory::new(config.sessions.path.clone()),
        )
    }

    pub fn with_routes(mut self, routes: impl RouteConfigurator + 'static) -> Self {
        self.routes = Box::new(routes);
        self
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Observe phase transitions.
    pub fn phases(&self) -> watch::Receiver<StartupPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> StartupPhase {
        *self.phase.borrow()
    }

    fn advance(&self, next: StartupPhase) {
        let previous = self.phase.send_replace(next);
        metrics::record_phase(next.ordinal());
        tracing::debug!(from = ?previous, to = ?next, "Startup phase changed");
    }

    /// Steps 1-3: agent, sessions, routes.
    pub async fn prepare(&self) -> Result<PreparedApp, StartupError> {
        let current = self.phase();
        if current != StartupPhase::NotStarted {
            return Err(StartupError::AlreadyStarted(current));
        }

        let agent = self.agent_factory.create().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize agent");
            e
        })?;
        tracing::info!(agent = %agent.name(), "Agent initialized");
        self.advance(StartupPhase::AgentReady);

        let sessions = initialize_sessions(self.session_factory.as_ref()).await;
        self.advance(if sessions.is_ready() {
            StartupPhase::SessionsReady
        } else {
            StartupPhase::SessionsDegraded
        });

        let state = AppState::new(agent, sessions);
        let options = RouteOptions {
            docs: self.config.debug,
        };
        let routes = self.routes.configure(Router::new(), &options);
        let router = assemble(routes, state.clone(), &self.filters, &self.config);
        tracing::info!(
            filters = ?self.filters,
            docs = options.docs,
            "Routes registered"
        );
        self.advance(StartupPhase::RoutesRegistered);

        Ok(PreparedApp {
            router,
            state,
            filters: self.filters.clone(),
        })
    }

    /// All four steps. Blocks until `shutdown` resolves and the server drains.
    pub async fn run<F>(self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let prepared = self.prepare().await?;
        let bound = ServerRunner::from_config(&self.config).bind().await?;

        self.advance(StartupPhase::Serving);
        let result = bound.serve(prepared.router, shutdown).await;
        self.advance(StartupPhase::Stopped);

        result.map_err(StartupError::from)
    }
}

/// Open the session store, downgrading any failure to a degraded state.
pub async fn initialize_sessions(factory: &dyn SessionStoreFactory) -> SessionAvailability {
    match factory.open().await {
        Ok(store) => {
            tracing::info!("Conversation sessions initialized");
            SessionAvailability::Ready(store)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                remediation = SESSION_REMEDIATION,
                "Failed to initialize conversation sessions: {}. You may need to {}",
                e,
                SESSION_REMEDIATION
            );
            SessionAvailability::Degraded {
                reason: e.to_string().into(),
            }
        }
    }
}

//! Conversational agent collaborator.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     AgentFactory::create() → Arc<dyn Agent> (fatal on failure)
//!
//! Per request:
//!     handler → Agent::respond(history, message) → reply text
//! ```
//!
//! # Design Decisions
//! - Reasoning is opaque to the server; only the contract lives here
//! - Traits return boxed futures so handles stay object safe
//! - Plain closures returning futures can act as factories

pub mod echo;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::conversation::Turn;

pub use echo::{ConfiguredAgentFactory, EchoAgent};

/// Errors raised by agents and their factories.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent could not be constructed.
    #[error("agent initialization failed: {0}")]
    Init(String),

    /// Persona file could not be read.
    #[error("failed to read agent persona {path}: {source}")]
    Persona {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The agent failed while producing a reply.
    #[error("agent failed to respond: {0}")]
    Respond(String),
}

/// A ready-to-use conversational agent.
pub trait Agent: Send + Sync {
    /// Name reported by health and docs endpoints.
    fn name(&self) -> &str;

    /// Produce a reply to `message`, given prior turns of the conversation.
    fn respond<'a>(
        &'a self,
        history: &'a [Turn],
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, AgentError>>;
}

/// Builds the agent once at startup.
pub trait AgentFactory: Send + Sync {
    fn create(&self) -> BoxFuture<'_, Result<Arc<dyn Agent>, AgentError>>;
}

impl<F, Fut> AgentFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn Agent>, AgentError>> + Send + 'static,
{
    fn create(&self) -> BoxFuture<'_, Result<Arc<dyn Agent>, AgentError>> {
        Box::pin(self())
    }
}

//! Conversation session collaborator.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     SessionStoreFactory::open()
//!         Ok  → SessionAvailability::Ready(store)
//!         Err → SessionAvailability::Degraded { reason }   (logged, not fatal)
//!
//! Per request:
//!     handler → SessionAvailability::store()
//!         → SessionStore::{create, get, append}
//!         → 503 when degraded
//! ```
//!
//! # Design Decisions
//! - A failed store never aborts startup
//! - Degraded state is a typed value, not an absent global
//! - `velarium migrate` provisions what the file store needs

pub mod file;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::conversation::{Session, Turn};

pub use file::{migrate, FileSessionStore, FileSessionStoreFactory, MigrationOutcome};

/// Errors raised by session stores and their factories.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Backing storage has not been provisioned.
    #[error("session store at {} is not migrated; run `velarium migrate` to provision it", path.display())]
    NotMigrated { path: PathBuf },

    /// Backing storage was provisioned by an incompatible version.
    #[error("session store schema {found:?} does not match {expected:?}; run `velarium migrate`")]
    SchemaMismatch { found: String, expected: String },

    #[error("session store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session document {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session {0} not found")]
    NotFound(Uuid),
}

/// Persistence for multi-turn conversations.
pub trait SessionStore: Send + Sync {
    /// Create and persist an empty session.
    fn create(&self) -> BoxFuture<'_, Result<Session, SessionStoreError>>;

    /// Fetch a session, `None` if it does not exist.
    fn get(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Session>, SessionStoreError>>;

    /// Append turns to an existing session and return the updated session.
    fn append(&self, id: Uuid, turns: Vec<Turn>) -> BoxFuture<'_, Result<Session, SessionStoreError>>;
}

/// Opens or restores the session store once at startup.
pub trait SessionStoreFactory: Send + Sync {
    fn open(&self) -> BoxFuture<'_, Result<Arc<dyn SessionStore>, SessionStoreError>>;
}

impl<F, Fut> SessionStoreFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn SessionStore>, SessionStoreError>> + Send + 'static,
{
    fn open(&self) -> BoxFuture<'_, Result<Arc<dyn SessionStore>, SessionStoreError>> {
        Box::pin(self())
    }
}

/// Outcome of session store initialization.
#[derive(Clone)]
pub enum SessionAvailability {
    Ready(Arc<dyn SessionStore>),
    Degraded { reason: Arc<str> },
}

impl SessionAvailability {
    /// The store, if initialization succeeded.
    pub fn store(&self) -> Option<&Arc<dyn SessionStore>> {
        match self {
            Self::Ready(store) => Some(store),
            Self::Degraded { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Degraded { .. } => "degraded",
        }
    }
}

impl std::fmt::Debug for SessionAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Degraded { reason } => f.debug_struct("Degraded").field("reason", reason).finish(),
        }
    }
}

//! Session store backed by one JSON document per session.
//!
//! Layout:
//! ```text
//! <root>/SCHEMA_VERSION       written by `velarium migrate`
//! <root>/<uuid>.json          one Session per file
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::conversation::{Session, Turn};
use crate::sessions::{SessionStore, SessionStoreError, SessionStoreFactory};

/// Marker file name inside the store directory.
pub const SCHEMA_FILE: &str = "SCHEMA_VERSION";

/// Current on-disk layout version.
pub const SCHEMA_VERSION: &str = "1";

/// File-backed [`SessionStore`] with an in-memory cache.
pub struct FileSessionStore {
    root: PathBuf,
    cache: DashMap<Uuid, Session>,
    /// Serializes read-modify-write cycles on session files.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open a provisioned store. Fails if `velarium migrate` has not run.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let root = root.into();
        let marker = root.join(SCHEMA_FILE);

        let found = match tokio::fs::read_to_string(&marker).await {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionStoreError::NotMigrated { path: root });
            }
            Err(source) => return Err(SessionStoreError::Io { path: marker, source }),
        };
        if found != SCHEMA_VERSION {
            return Err(SessionStoreError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION.to_string(),
            });
        }

        tracing::debug!(path = %root.display(), "Session store opened");
        Ok(Self {
            root,
            cache: DashMap::new(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn load(&self, id: Uuid) -> Result<Option<Session>, SessionStoreError> {
        let cached = self.cache.get(&id).map(|s| s.clone());
        if cached.is_some() {
            return Ok(cached);
        }

        let path = self.document_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionStoreError::Io { path, source }),
        };
        let session: Session = serde_json::from_slice(&bytes)
            .map_err(|source| SessionStoreError::Corrupt { path, source })?;

        self.cache.insert(id, session.clone());
        Ok(Some(session))
    }

    async fn persist(&self, session: &Session) -> Result<(), SessionStoreError> {
        let path = self.document_path(session.id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session).map_err(|source| {
            SessionStoreError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|source| SessionStoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| SessionStoreError::Io { path, source })?;

        self.cache.insert(session.id, session.clone());
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn create(&self) -> BoxFuture<'_, Result<Session, SessionStoreError>> {
        Box::pin(async move {
            let session = Session::new();
            let _guard = self.write_lock.lock().await;
            self.persist(&session).await?;
            tracing::debug!(session_id = %session.id, "Session created");
            Ok(session)
        })
    }

    fn get(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Session>, SessionStoreError>> {
        Box::pin(self.load(id))
    }

    fn append(&self, id: Uuid, turns: Vec<Turn>) -> BoxFuture<'_, Result<Session, SessionStoreError>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut session = self
                .load(id)
                .await?
                .ok_or(SessionStoreError::NotFound(id))?;
            session.turns.extend(turns);
            self.persist(&session).await?;
            Ok(session)
        })
    }
}

/// Opens a [`FileSessionStore`] at a fixed directory.
#[derive(Debug, Clone)]
pub struct FileSessionStoreFactory {
    root: PathBuf,
}

impl FileSessionStoreFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SessionStoreFactory for FileSessionStoreFactory {
    fn open(&self) -> BoxFuture<'_, Result<Arc<dyn SessionStore>, SessionStoreError>> {
        Box::pin(async move {
            let store = FileSessionStore::open(self.root.clone()).await?;
            Ok(Arc::new(store) as Arc<dyn SessionStore>)
        })
    }
}

/// Result of provisioning the store directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    AlreadyCurrent,
}

/// Provision the store directory and schema marker.
pub async fn migrate(root: &Path) -> Result<MigrationOutcome, SessionStoreError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SessionStoreError::Io { path, source }
    };

    tokio::fs::create_dir_all(root).await.map_err(io_err(root))?;

    let marker = root.join(SCHEMA_FILE);
    match tokio::fs::read_to_string(&marker).await {
        Ok(found) if found.trim() == SCHEMA_VERSION => return Ok(MigrationOutcome::AlreadyCurrent),
        Ok(found) => {
            tracing::warn!(found = %found.trim(), expected = SCHEMA_VERSION, "Rewriting session schema marker");
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => return Err(SessionStoreError::Io { path: marker, source }),
    }

    tokio::fs::write(&marker, format!("{}\n", SCHEMA_VERSION))
        .await
        .map_err(io_err(marker.as_path()))?;
    tracing::info!(path = %root.display(), version = SCHEMA_VERSION, "Session store migrated");
    Ok(MigrationOutcome::Applied)
}

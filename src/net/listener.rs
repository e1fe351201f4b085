//! Listening endpoints: TCP host/port or a Unix domain socket.
//!
//! # Responsibilities
//! - Resolve and bind the configured endpoint
//! - Replace stale socket files and clean them up on drop
//! - Report bind failures as fatal errors

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;

/// Where the server listens. A socket path excludes host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl std::fmt::Display for BindTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindTarget::Tcp { host, port } if host.contains(':') => write!(f, "[{}]:{}", host, port),
            BindTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
            BindTarget::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to the endpoint.
    #[error("failed to bind {target}: {source}")]
    Bind {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS material could not be loaded.
    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] std::io::Error),

    /// TLS was requested for a Unix domain socket.
    #[error("TLS cannot be served on a unix socket")]
    TlsOnSocket,

    /// Unix sockets are not available on this platform.
    #[error("unix sockets are not supported on this platform")]
    UnsupportedSocket,
}

impl ListenerError {
    fn bind(target: &BindTarget, source: std::io::Error) -> Self {
        ListenerError::Bind {
            target: target.to_string(),
            source,
        }
    }
}

/// A bound, not yet serving, endpoint.
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixSocket),
}

impl Listener {
    /// Bind the target.
    pub async fn bind(target: &BindTarget) -> Result<Self, ListenerError> {
        match target {
            BindTarget::Tcp { host, port } => {
                let listener = TcpListener::bind((host.as_str(), *port))
                    .await
                    .map_err(|e| ListenerError::bind(target, e))?;
                Ok(Listener::Tcp(listener))
            }
            #[cfg(unix)]
            BindTarget::Unix(path) => UnixSocket::bind(path)
                .map(Listener::Unix)
                .map_err(|e| ListenerError::bind(target, e)),
            #[cfg(not(unix))]
            BindTarget::Unix(_) => Err(ListenerError::UnsupportedSocket),
        }
    }

    /// Local TCP address, `None` for Unix sockets.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Listener::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Listener::Unix(_) => None,
        }
    }

    /// Human-readable endpoint for logs.
    pub fn describe(&self) -> String {
        match self {
            Listener::Tcp(listener) => listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "tcp:unknown".to_string()),
            #[cfg(unix)]
            Listener::Unix(socket) => format!("unix:{}", socket.path().display()),
        }
    }
}

/// Bound Unix socket that removes its file when dropped.
#[cfg(unix)]
#[derive(Debug)]
pub struct UnixSocket {
    listener: Option<UnixListener>,
    path: PathBuf,
}

#[cfg(unix)]
impl UnixSocket {
    fn bind(path: &Path) -> Result<Self, std::io::Error> {
        remove_stale_socket(path)?;
        let listener = UnixListener::bind(path)?;
        tracing::debug!(path = %path.display(), "Unix socket bound");
        Ok(Self {
            listener: Some(listener),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand the listener to the server loop; the file stays owned by `self`.
    pub fn take_listener(&mut self) -> Option<UnixListener> {
        self.listener.take()
    }
}

#[cfg(unix)]
impl Drop for UnixSocket {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove socket file");
            }
        }
    }
}

/// Remove a socket left behind by a previous run. Other file types are kept
/// so that binding fails instead of clobbering them.
#[cfg(unix)]
fn remove_stale_socket(path: &Path) -> Result<(), std::io::Error> {
    use std::os::unix::fs::FileTypeExt;

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::debug!(path = %path.display(), "Removing stale socket");
            std::fs::remove_file(path)
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_brackets_ipv6_hosts() {
        let target = BindTarget::Tcp {
            host: "::1".into(),
            port: 8488,
        };
        assert_eq!(target.to_string(), "[::1]:8488");
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = Listener::bind(&BindTarget::Tcp {
            host: "127.0.0.1".into(),
            port,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn socket_file_is_replaced_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velarium.sock");
        let target = BindTarget::Unix(path.clone());

        let first = Listener::bind(&target).await.unwrap();
        assert!(path.exists());
        // A leftover socket file from a crashed run must not block binding.
        std::mem::forget(first);
        let second = Listener::bind(&target).await.unwrap();
        assert_eq!(second.describe(), format!("unix:{}", path.display()));

        drop(second);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn regular_file_at_socket_path_is_not_clobbered() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = Listener::bind(&BindTarget::Unix(file.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert!(file.path().exists());
    }
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::task::JoinHandle;
use tracing_subscriber::fmt::MakeWriter;
use velarium::agent::{Agent, AgentError, EchoAgent};
use velarium::config::{ServerConfig, TlsConfig};
use velarium::http::{ServeError, ServerRunner};
use velarium::lifecycle::Shutdown;
use velarium::net::BindTarget;
use velarium::sessions::{self, FileSessionStoreFactory};

/// Server config bound to an ephemeral loopback port.
pub fn loopback_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// Agent factory used by most tests.
pub async fn echo_agent() -> Result<Arc<dyn Agent>, AgentError> {
    Ok(Arc::new(EchoAgent::new("test-agent")))
}

/// A provisioned session directory and a factory pointing at it.
pub async fn migrated_sessions() -> (tempfile::TempDir, FileSessionStoreFactory) {
    let dir = tempfile::tempdir().unwrap();
    sessions::migrate(dir.path()).await.unwrap();
    let factory = FileSessionStoreFactory::new(dir.path());
    (dir, factory)
}

/// An application serving on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServeError>>,
}

impl TestServer {
    pub async fn start(app: Router) -> Self {
        let runner = ServerRunner::new(BindTarget::Tcp {
            host: "127.0.0.1".into(),
            port: 0,
        });
        let bound = runner.bind().await.unwrap();
        let addr = bound.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(bound.serve(app, shutdown.signalled()));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// A freshly generated self-signed certificate for `localhost`, written as PEM.
pub fn self_signed_tls() -> (tempfile::TempDir, TlsConfig) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = TlsConfig {
        cert_path: dir.path().join("cert.pem"),
        key_path: dir.path().join("key.pem"),
    };
    std::fs::write(&config.cert_path, cert.pem()).unwrap();
    std::fs::write(&config.key_path, key_pair.serialize_pem()).unwrap();
    (dir, config)
}

/// Client that accepts the self-signed test certificate.
pub fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

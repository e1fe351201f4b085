//! Certificate loading for HTTPS listeners.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;
use crate::net::ListenerError;

/// Read the PEM certificate chain and key named in `config`.
///
/// Missing files are reported by name before rustls gets to parse anything.
pub async fn load(config: &TlsConfig) -> Result<RustlsConfig, ListenerError> {
    for (what, path) in [("certificate", &config.cert_path), ("private key", &config.key_path)] {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ListenerError::Tls(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} file not found: {}", what, path.display()),
            )));
        }
    }

    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(ListenerError::Tls)
}

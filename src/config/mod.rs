//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → environment (DEBUG) and CLI overrides
//!     → VelariumConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, load_config, ConfigError};
pub use schema::{
    AgentConfig, ObservabilityConfig, ServerConfig, SessionConfig, TlsConfig, VelariumConfig,
};

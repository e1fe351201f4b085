//! Velarium conversational-agent server library.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod sessions;

pub use config::VelariumConfig;
pub use http::ServerRunner;
pub use lifecycle::{Shutdown, StartupSequencer};

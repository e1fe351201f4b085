//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! BindTarget (from config, socket wins over host:port)
//!     → listener.rs (bind TCP or Unix socket)
//!     → tls.rs (optional, TCP only)
//!     → Hand off to the HTTP server runner
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal and never retried
//! - Stale Unix socket files are replaced; other files are left alone

pub mod listener;
pub mod tls;

pub use listener::{BindTarget, Listener, ListenerError};

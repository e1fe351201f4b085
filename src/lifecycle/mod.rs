//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     NotStarted → AgentReady → (SessionsReady | SessionsDegraded)
//!         → RoutesRegistered → Serving → Stopped
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight requests drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: agent, then sessions, then routes, then listener
//! - A missing agent is fatal; a missing session store only degrades

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{PreparedApp, StartupError, StartupPhase, StartupSequencer};

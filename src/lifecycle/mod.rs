//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Register routes → Bind → Run
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Close connections → Wait for sessions
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listener binds last (traffic only when routes are in place)
//! - Shutdown has a grace deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

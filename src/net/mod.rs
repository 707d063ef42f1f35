//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (ConnectionId + close signal)
//!     → registry.rs (one live connection per peer IP)
//!     → Hand off to server session
//!
//! Connection ends on:
//!     peer close | socket error | idle timeout | displaced by same peer | shutdown
//! ```
//!
//! # Design Decisions
//! - A reconnecting peer displaces its own stale connection
//! - Evictions are identity-checked, so late timers are harmless
//! - Closing fires the token before the socket is dropped

pub mod connection;
pub mod listener;
pub mod registry;

pub use connection::{ConnectionGuard, ConnectionHandle, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use registry::ConnectionRegistry;

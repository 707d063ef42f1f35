//! Framed message server library.
//!
//! Accepts persistent TCP connections carrying `#`-terminated
//! `VERB PATH\nBODY` messages and dispatches them to handlers chosen by
//! verb and path pattern.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod server;

pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use protocol::{Request, Responder, Response};
pub use server::Server;

//! Server subsystem.
//!
//! # Data Flow
//! ```text
//! Listener.accept()
//!     → app.rs (spawn session task)
//!     → session.rs
//!         → registry.admit (displace stale peer connection)
//!         → read loop: FrameCodec → Request → Router → Responder
//!         → write framed response
//!         → registry.evict on close / timeout / error
//! ```
//!
//! # Design Decisions
//! - One task per connection; frames within it are handled in order
//! - Handlers are synchronous and run on the session task
//! - Per-message failures never end the connection, let alone the process

pub mod app;
mod session;

pub use app::Server;

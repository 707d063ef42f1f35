//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Raw bytes from socket
//!     → frame.rs (append to buffer, split on '#', trim)
//!     → request.rs (VERB PATH\nBODY → Request)
//!     → routing
//!
//! Handler output:
//!     Responder → Response
//!     → response.rs (VERB PATH\nCONTENT\n#)
//!     → socket
//! ```
//!
//! # Design Decisions
//! - Inbound and outbound share one framing
//! - No escaping: '#' is reserved and cannot appear inside a message
//! - Bodies are opaque text; JSON decoding is lazy and handler-driven

pub mod frame;
pub mod request;
pub mod response;

pub use frame::{FrameCodec, TERMINATOR};
pub use request::{Params, ParseError, Request};
pub use response::{Responder, Response};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (verb, path)
//!     → router.rs (walk routes, most recent first)
//!     → matcher.rs (compare path segments, capture params)
//!     → Return: Handled { response } or NoMatch
//!
//! Route Compilation (at registration):
//!     (verb, "/report/:id", handler)
//!     → split on '/', drop empty segments
//!     → Literal / Param / Wildcard segments
//!     → push onto route table
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, never re-parsed per request
//! - No regex in hot path
//! - Ambiguity resolved by recency of registration, not specificity
//! - First match wins

pub mod matcher;
pub mod router;

pub use matcher::{Location, Segment};
pub use router::{Dispatch, Handler, Route, Router};

//! Observer hook for connection and message events.
//!
//! The core never logs on its own behalf for per-message drops; it calls
//! an [`Observer`], so silent drops stay silent on the wire while staying
//! visible to whoever installs an observer.

use std::fmt;
use std::net::SocketAddr;

use crate::net::ConnectionHandle;
use crate::protocol::{ParseError, Request};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed its side.
    PeerClosed,
    /// No bytes arrived within the idle timeout.
    IdleTimeout,
    /// Closed through the registry (displaced or shut down).
    Evicted,
    /// Read or write failed.
    SocketError,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::IdleTimeout => "idle_timeout",
            CloseReason::Evicted => "evicted",
            CloseReason::SocketError => "socket_error",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives server events. Every method defaults to a no-op.
pub trait Observer: Send + Sync {
    fn connection_admitted(&self, _conn: &ConnectionHandle) {}

    /// `old` was closed because `new` arrived from the same peer.
    fn connection_displaced(&self, _old: &ConnectionHandle, _new: &ConnectionHandle) {}

    fn connection_closed(&self, _conn: &ConnectionHandle, _reason: CloseReason) {}

    fn frame_rejected(&self, _peer: SocketAddr, _frame: &str, _error: &ParseError) {}

    fn request_unmatched(&self, _req: &Request) {}

    fn request_handled(&self, _req: &Request, _pattern: &str, _responded: bool) {}

    fn handler_panicked(&self, _req: &Request) {}

    fn socket_error(&self, _conn: &ConnectionHandle, _error: &std::io::Error) {}
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn connection_admitted(&self, conn: &ConnectionHandle) {
        tracing::info!(connection_id = %conn.id(), peer_addr = %conn.peer(), "Connection admitted");
    }

    fn connection_displaced(&self, old: &ConnectionHandle, new: &ConnectionHandle) {
        tracing::info!(
            connection_id = %old.id(),
            replaced_by = %new.id(),
            peer_addr = %old.peer(),
            "Connection displaced by same peer"
        );
    }

    fn connection_closed(&self, conn: &ConnectionHandle, reason: CloseReason) {
        tracing::info!(connection_id = %conn.id(), peer_addr = %conn.peer(), %reason, "Connection closed");
    }

    fn frame_rejected(&self, peer: SocketAddr, frame: &str, error: &ParseError) {
        tracing::debug!(peer_addr = %peer, frame_len = frame.len(), %error, "Frame dropped");
    }

    fn request_unmatched(&self, req: &Request) {
        tracing::debug!(peer_addr = %req.peer(), verb = %req.verb(), path = %req.path(), "No route matched");
    }

    fn request_handled(&self, req: &Request, pattern: &str, responded: bool) {
        tracing::trace!(
            peer_addr = %req.peer(),
            verb = %req.verb(),
            path = %req.path(),
            pattern,
            responded,
            "Request handled"
        );
    }

    fn handler_panicked(&self, req: &Request) {
        tracing::error!(peer_addr = %req.peer(), verb = %req.verb(), path = %req.path(), "Handler panicked");
    }

    fn socket_error(&self, conn: &ConnectionHandle, error: &std::io::Error) {
        tracing::warn!(connection_id = %conn.id(), peer_addr = %conn.peer(), %error, "Socket error");
    }
}

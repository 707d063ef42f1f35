//! Connection identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Give each connection a close signal the registry can fire
//! - Count live sessions for graceful shutdown

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Shared handle to one live connection.
///
/// Clones refer to the same connection. Closing cancels the session's
/// token; the session stops dispatching and drops its socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: SocketAddr,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(peer: SocketAddr) -> Self {
        Self::with_token(peer, CancellationToken::new())
    }

    /// A handle that is also closed when `parent` is cancelled.
    pub fn child_of(peer: SocketAddr, parent: &CancellationToken) -> Self {
        Self::with_token(peer, parent.child_token())
    }

    fn with_token(peer: SocketAddr, cancel: CancellationToken) -> Self {
        Self {
            id: ConnectionId::new(),
            peer,
            cancel,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Signal the session to stop. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }
}

/// Counts running sessions so shutdown can wait for them.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active sessions.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new session. Returns a guard that decrements on drop.
    pub fn track(&self, id: ConnectionId) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id,
        }
    }

    /// Get current active session count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every session has ended, or `grace` elapses.
    ///
    /// Returns `true` if all sessions ended in time.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        let drained = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

/// Guard that tracks a session's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Session ended");
    }
}

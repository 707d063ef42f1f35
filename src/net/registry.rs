//! Per-peer connection registry.
//!
//! # Responsibilities
//! - Keep at most one live connection per peer IP
//! - Displace the old connection when a peer reconnects
//! - Ignore evictions for connections that were already replaced
//! - Once closed, keep every connection closed, including ones not yet admitted
//!
//! # Design Decisions
//! - Keyed by peer IP only: one logical peer per address
//! - Identity is the ConnectionId, never the address
//! - DashMap gives per-key locking across the runtime's worker threads

use std::net::{IpAddr, SocketAddr};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::net::connection::{ConnectionHandle, ConnectionId};

/// Registry of live connections keyed by peer IP.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<IpAddr, ConnectionHandle>,
    /// Parent of every handle created through [`connection`](Self::connection).
    root: CancellationToken,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle for a freshly accepted connection from `peer`.
    ///
    /// The handle is closed by [`close_all`](Self::close_all) even if it
    /// has not been admitted yet, and is born closed once that has run.
    pub fn connection(&self, peer: SocketAddr) -> ConnectionHandle {
        ConnectionHandle::child_of(peer, &self.root)
    }

    /// Register `handle` as the live connection for its peer.
    ///
    /// Any other connection registered under the same IP is closed and
    /// returned. Re-admitting the same connection is a no-op, and a handle
    /// that is already closed is never registered.
    pub fn admit(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let key = handle.peer().ip();
        let displaced = match self.connections.entry(key) {
            // checked under the entry lock; close_all cancels the root before clearing
            _ if handle.is_closed() => None,
            Entry::Occupied(mut entry) => {
                if entry.get().id() == handle.id() {
                    None
                } else {
                    Some(entry.insert(handle))
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(handle);
                None
            }
        };

        if let Some(old) = &displaced {
            old.close();
        }
        displaced
    }

    /// Remove `handle` if it is still the registered connection for its peer.
    ///
    /// Returns `true` if an entry was removed. When `close` is set the
    /// connection is closed whether or not it was still registered.
    pub fn evict(&self, handle: &ConnectionHandle, close: bool) -> bool {
        let removed = self
            .connections
            .remove_if(&handle.peer().ip(), |_, current| current.id() == handle.id())
            .is_some();

        if close {
            handle.close();
        }
        removed
    }

    /// The connection currently registered for `ip`.
    pub fn lookup(&self, ip: IpAddr) -> Option<ConnectionId> {
        self.connections.get(&ip).map(|entry| entry.id())
    }

    pub fn contains(&self, handle: &ConnectionHandle) -> bool {
        self.lookup(handle.peer().ip()) == Some(handle.id())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Close and forget every registered connection.
    ///
    /// Handles from [`connection`](Self::connection) that are still on
    /// their way to [`admit`](Self::admit) are closed as well.
    pub fn close_all(&self) -> usize {
        self.root.cancel();
        let handles: Vec<ConnectionHandle> = self.connections.iter().map(|e| e.value().clone()).collect();
        self.connections.clear();
        for handle in &handles {
            handle.close();
        }
        handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn handle(addr: &str) -> ConnectionHandle {
        ConnectionHandle::new(addr.parse::<SocketAddr>().unwrap())
    }

    #[test]
    fn admit_registers_new_peer() {
        let registry = ConnectionRegistry::new();
        let conn = handle("10.0.0.1:5000");

        assert!(registry.admit(conn.clone()).is_none());
        assert_eq!(registry.lookup(conn.peer().ip()), Some(conn.id()));
        assert!(registry.contains(&conn));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_ip_displaces_previous_connection() {
        let registry = ConnectionRegistry::new();
        let first = handle("10.0.0.1:5000");
        let second = handle("10.0.0.1:5001");

        registry.admit(first.clone());
        let displaced = registry.admit(second.clone()).unwrap();

        assert_eq!(displaced.id(), first.id());
        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(registry.lookup("10.0.0.1".parse().unwrap()), Some(second.id()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn readmitting_same_connection_is_noop() {
        let registry = ConnectionRegistry::new();
        let conn = handle("10.0.0.1:5000");

        registry.admit(conn.clone());
        assert!(registry.admit(conn.clone()).is_none());
        assert!(!conn.is_closed());
    }

    #[test]
    fn different_ips_coexist() {
        let registry = ConnectionRegistry::new();
        registry.admit(handle("10.0.0.1:5000"));
        registry.admit(handle("10.0.0.2:5000"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn evict_removes_current_connection() {
        let registry = ConnectionRegistry::new();
        let conn = handle("10.0.0.1:5000");
        registry.admit(conn.clone());

        assert!(registry.evict(&conn, true));
        assert!(conn.is_closed());
        assert!(registry.is_empty());
    }

    #[test]
    fn evict_without_close_leaves_connection_open() {
        let registry = ConnectionRegistry::new();
        let conn = handle("10.0.0.1:5000");
        registry.admit(conn.clone());

        assert!(registry.evict(&conn, false));
        assert!(!conn.is_closed());
    }

    #[test]
    fn stale_eviction_is_noop() {
        let registry = ConnectionRegistry::new();
        let first = handle("10.0.0.1:5000");
        let second = handle("10.0.0.1:5001");
        registry.admit(first.clone());
        registry.admit(second.clone());

        // e.g. the first connection's idle timer firing after displacement
        assert!(!registry.evict(&first, true));
        assert!(registry.contains(&second));
        assert!(!second.is_closed());
    }

    #[test]
    fn repeated_eviction_is_noop() {
        let registry = ConnectionRegistry::new();
        let conn = handle("10.0.0.1:5000");
        registry.admit(conn.clone());

        assert!(registry.evict(&conn, true));
        assert!(!registry.evict(&conn, true));
    }

    #[test]
    fn close_all_closes_everything() {
        let registry = ConnectionRegistry::new();
        let a = handle("10.0.0.1:5000");
        let b = handle("10.0.0.2:5000");
        registry.admit(a.clone());
        registry.admit(b.clone());

        assert_eq!(registry.close_all(), 2);
        assert!(a.is_closed() && b.is_closed());
        assert!(registry.is_empty());
    }

    #[test]
    fn close_all_reaches_connections_not_yet_admitted() {
        let registry = ConnectionRegistry::new();
        let pending = registry.connection("10.0.0.1:5000".parse().unwrap());

        registry.close_all();

        assert!(pending.is_closed());
        assert!(registry.admit(pending).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn connections_created_after_close_all_are_closed() {
        let registry = ConnectionRegistry::new();
        registry.close_all();

        let late = registry.connection("10.0.0.3:5000".parse().unwrap());
        assert!(registry.is_closed());
        assert!(late.is_closed());

        registry.admit(late);
        assert!(registry.is_empty());
    }

    #[test]
    fn closed_handle_does_not_displace_live_one() {
        let registry = ConnectionRegistry::new();
        let live = handle("10.0.0.1:5000");
        let dead = handle("10.0.0.1:5001");
        registry.admit(live.clone());
        dead.close();

        assert!(registry.admit(dead).is_none());
        assert!(registry.contains(&live));
        assert!(!live.is_closed());
    }
}

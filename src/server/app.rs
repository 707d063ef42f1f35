//! Server setup and accept loop.
//!
//! # Responsibilities
//! - Collect routes before the server starts
//! - Bind the listener from configuration
//! - Spawn one session task per accepted connection
//! - On shutdown: stop accepting, close every connection, wait for sessions

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::net::{ConnectionRegistry, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::observability::{Observer, TracingObserver};
use crate::routing::{Handler, Router};
use crate::server::session::{self, SessionContext};

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A framed-message server.
///
/// Routes are registered up front with [`route`](Self::route); the table
/// is frozen once [`run`](Self::run) starts.
pub struct Server {
    config: ServerConfig,
    router: Router,
    observer: Arc<dyn Observer>,
    registry: Arc<ConnectionRegistry>,
    tracker: ConnectionTracker,
}

impl Server {
    /// Create a server that reports events through [`TracingObserver`].
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            observer: Arc::new(TracingObserver),
            registry: Arc::new(ConnectionRegistry::new()),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Replace the event observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Register `handler` for `verb` requests whose path matches `pattern`.
    ///
    /// Later registrations take precedence over earlier overlapping ones.
    pub fn route<H>(&mut self, verb: &str, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.router.register(verb, pattern, handler);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Live connection registry, shared with running sessions.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> Result<Listener, ListenerError> {
        Listener::bind(&self.config.listener).await
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.router.len(),
            idle_timeout_ms = self.config.connection.idle_timeout_ms,
            "Server starting"
        );

        let ctx = Arc::new(SessionContext {
            router: self.router,
            registry: Arc::clone(&self.registry),
            observer: self.observer,
            idle_timeout: self.config.connection.idle_timeout(),
        });

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        // tracked before spawning so the shutdown drain waits for it
                        let handle = self.registry.connection(peer);
                        let guard = self.tracker.track(handle.id());
                        tokio::spawn(session::run(stream, handle, guard, Arc::clone(&ctx)));
                    }
                    Err(error) => {
                        tracing::warn!(%error, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, closing connections");
                    break;
                }
            }
        }

        drop(listener);
        let closed = self.registry.close_all();
        metrics::set_active_connections(0);

        if !self.tracker.wait_idle(self.config.connection.shutdown_grace()).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Sessions still running after shutdown grace period"
            );
        }

        tracing::info!(closed, "Server stopped");
        Ok(())
    }
}

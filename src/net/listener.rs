//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Report accept errors without tearing down the accept loop

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Configured address is not a valid socket address.
    #[error("Invalid bind address {address:?}: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|source| ListenerError::Address {
                address: config.bind_address.clone(),
                source,
            })?;

        let inner = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

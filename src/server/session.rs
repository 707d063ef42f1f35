//! Per-connection session loop.
//!
//! # Responsibilities
//! - Register the connection, displacing a stale one from the same peer
//! - Read bytes, decode frames, dispatch requests in arrival order
//! - Write responses back on the same socket
//! - Evict on idle timeout, peer close, socket error or external close

use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::codec::{Decoder, Encoder};

use crate::net::{ConnectionGuard, ConnectionHandle, ConnectionRegistry};
use crate::observability::metrics;
use crate::observability::{CloseReason, Observer};
use crate::protocol::{FrameCodec, Request, Response};
use crate::routing::{Dispatch, Router};

const READ_CHUNK: usize = 4096;

/// State shared by every session of one server.
pub(crate) struct SessionContext {
    pub(crate) router: Router,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) observer: Arc<dyn Observer>,
    pub(crate) idle_timeout: Duration,
}

impl SessionContext {
    /// Parse and dispatch one frame. Returns the response to write, if any.
    pub(crate) fn handle_frame(&self, frame: &str, peer: SocketAddr) -> Option<Response> {
        let mut req = match Request::parse(frame, peer) {
            Ok(req) => req,
            Err(error) => {
                metrics::record_rejected(error.reason());
                self.observer.frame_rejected(peer, frame, &error);
                return None;
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.router.dispatch(&mut req)));

        match outcome {
            Ok(Dispatch::Handled { pattern, response }) => {
                self.observer.request_handled(&req, &pattern, response.is_some());
                response
            }
            Ok(Dispatch::NoMatch) => {
                metrics::record_unmatched();
                self.observer.request_unmatched(&req);
                None
            }
            Err(_) => {
                self.observer.handler_panicked(&req);
                None
            }
        }
    }
}

/// Drive one accepted connection until it ends.
///
/// `_guard` was taken by the accept loop and is released when the session
/// ends. A handle closed before the task got to run is dropped unserved.
pub(crate) async fn run(
    stream: TcpStream,
    handle: ConnectionHandle,
    _guard: ConnectionGuard,
    ctx: Arc<SessionContext>,
) {
    if handle.is_closed() {
        tracing::debug!(
            connection_id = %handle.id(),
            peer = %handle.peer(),
            "Connection closed before admission"
        );
        return;
    }

    if let Some(old) = ctx.registry.admit(handle.clone()) {
        ctx.observer.connection_displaced(&old, &handle);
    }
    ctx.observer.connection_admitted(&handle);
    metrics::set_active_connections(ctx.registry.len());

    let reason = serve(stream, &handle, &ctx).await;

    ctx.registry.evict(&handle, true);
    metrics::record_eviction(reason.as_str());
    metrics::set_active_connections(ctx.registry.len());
    ctx.observer.connection_closed(&handle, reason);
}

async fn serve(mut stream: TcpStream, handle: &ConnectionHandle, ctx: &SessionContext) -> CloseReason {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut out = BytesMut::new();

    loop {
        buf.reserve(READ_CHUNK);

        let read = tokio::select! {
            biased;
            _ = handle.closed() => return CloseReason::Evicted,
            read = time::timeout(ctx.idle_timeout, stream.read_buf(&mut buf)) => read,
        };

        match read {
            Err(_elapsed) => return CloseReason::IdleTimeout,
            Ok(Ok(0)) => return CloseReason::PeerClosed,
            Ok(Ok(_)) => {}
            Ok(Err(error)) => {
                ctx.observer.socket_error(handle, &error);
                return CloseReason::SocketError;
            }
        }

        loop {
            let frame = match codec.decode(&mut buf) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(error) => {
                    ctx.observer.socket_error(handle, &error);
                    return CloseReason::SocketError;
                }
            };

            if handle.is_closed() {
                return CloseReason::Evicted;
            }
            metrics::record_frame();

            let Some(response) = ctx.handle_frame(&frame, handle.peer()) else {
                continue;
            };

            out.clear();
            if let Err(error) = codec.encode(response, &mut out) {
                ctx.observer.socket_error(handle, &error);
                return CloseReason::SocketError;
            }

            // a peer that stops reading counts as idle
            let written = tokio::select! {
                biased;
                _ = handle.closed() => return CloseReason::Evicted,
                written = time::timeout(ctx.idle_timeout, stream.write_all(&out)) => written,
            };
            match written {
                Ok(Ok(())) => metrics::record_response(),
                Err(_elapsed) => return CloseReason::IdleTimeout,
                Ok(Err(error)) => {
                    ctx.observer.socket_error(handle, &error);
                    return CloseReason::SocketError;
                }
            }
        }
    }
}

//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hashwire::config::ServerConfig;
use hashwire::net::{ConnectionRegistry, Listener};
use hashwire::{Server, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server running on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub registry: Arc<ConnectionRegistry>,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

/// Config bound to `127.0.0.1:0` with the given idle timeout.
pub fn test_config(idle_timeout_ms: u64) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.connection.idle_timeout_ms = idle_timeout_ms;
    config.connection.shutdown_grace_ms = 1_000;
    config
}

/// Bind and run `server` in the background.
pub async fn start(server: Server) -> TestServer {
    let listener: Listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = server.registry();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let task = tokio::spawn(async move { server.run(listener, rx).await });

    TestServer {
        addr,
        shutdown,
        registry,
        task,
    }
}

pub async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

pub async fn send(stream: &mut TcpStream, data: &str) {
    stream.write_all(data.as_bytes()).await.unwrap();
}

/// Read one `#`-terminated frame, or `None` on timeout / EOF.
#[allow(dead_code)]
pub async fn read_frame(stream: &mut TcpStream, wait: Duration) -> Option<String> {
    let mut frame = Vec::new();
    let mut byte = [0u8; 1];

    let read = async {
        loop {
            match stream.read(&mut byte).await {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    frame.push(byte[0]);
                    if byte[0] == b'#' {
                        return Some(String::from_utf8_lossy(&frame).into_owned());
                    }
                }
            }
        }
    };

    tokio::time::timeout(wait, read).await.ok().flatten()
}

/// True if the server closes `stream` within `wait`.
#[allow(dead_code)]
pub async fn closed_within(stream: &mut TcpStream, wait: Duration) -> bool {
    let mut buf = [0u8; 64];
    let read = async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    };
    tokio::time::timeout(wait, read).await.is_ok()
}

/// Poll `check` until it holds or `wait` elapses.
#[allow(dead_code)]
pub async fn eventually(wait: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + wait;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

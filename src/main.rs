//! hashwire server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Peer socket ──bytes──▶ net (listener, registry)
//!                                 │
//!                                 ▼
//!                     protocol::frame  (split on '#')
//!                                 │
//!                                 ▼
//!                     protocol::request (VERB PATH\nBODY)
//!                                 │
//!                                 ▼
//!                     routing (verb + location, most recent first)
//!                                 │
//!                                 ▼
//!                          handler ──▶ Responder
//!                                 │
//!     Peer socket ◀──bytes── protocol::response (VERB PATH\nCONTENT\n#)
//! ```

use std::path::PathBuf;

use clap::Parser;
use hashwire::config::{load_config, validate_config, ServerConfig};
use hashwire::lifecycle::{signals, Shutdown};
use hashwire::observability::{logging, metrics};
use hashwire::{Request, Responder, Server};

#[derive(Parser)]
#[command(name = "hashwire")]
#[command(about = "Framed message server with verb/path routing", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(|errors| format!("invalid --bind: {}", errors[0]))?;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("hashwire v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let mut server = Server::new(config);
    register_routes(&mut server);

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));

    let listener = server.bind().await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(server: &mut Server) {
    server
        .route("PING", "/", |req: &Request, res: &mut Responder| {
            res.send("PONG", "/", req.raw());
        })
        .route("P", "/test-number", |req: &Request, _: &mut Responder| {
            match req.json() {
                Ok(value) => tracing::info!(peer_addr = %req.peer(), %value, "test-number"),
                Err(error) => tracing::warn!(peer_addr = %req.peer(), %error, "test-number: bad payload"),
            }
        })
        .route("P", "/report/:id", |req: &Request, _: &mut Responder| {
            let id = req.param("id").unwrap_or_default();
            match req.json() {
                Ok(value) => tracing::info!(peer_addr = %req.peer(), id, temp = %value["temp"], "report"),
                Err(error) => tracing::warn!(peer_addr = %req.peer(), id, %error, "report: bad payload"),
            }
        });
}

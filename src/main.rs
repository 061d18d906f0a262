//! Zoneball Game Server
//!
//! Authoritative server binary. Binds the TCP listener and runs the
//! simulation loop until killed.
//!
//! The port comes from the first CLI argument, then the `ZONEBALL_PORT`
//! environment variable, then the default.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zoneball::network::server::{GameServer, ServerConfig};
use zoneball::{DEFAULT_PORT, TICK_RATE, VERSION};

fn listen_port() -> anyhow::Result<u16> {
    if let Some(arg) = std::env::args().nth(1) {
        return arg
            .parse()
            .with_context(|| format!("invalid port argument {arg:?}"));
    }
    if let Ok(var) = std::env::var("ZONEBALL_PORT") {
        return var
            .parse()
            .with_context(|| format!("invalid ZONEBALL_PORT value {var:?}"));
    }
    Ok(DEFAULT_PORT)
}

// The whole server is one simulation loop plus byte-shuttling tasks; a
// single-threaded runtime covers it.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Zoneball Server v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let port = listen_port()?;
    let config = ServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        tick_rate: TICK_RATE,
    };

    let server = GameServer::bind(config)
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    server.run().await.context("server loop failed")?;

    Ok(())
}

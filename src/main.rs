use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tracing::{debug, error, info, warn};

use ftp_proxy::types::BufferSize;
use ftp_proxy::{BufferPool, Config, ControlSession, load_config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env)]
    port: Option<u16>,

    /// Host to bind to (overrides config file)
    #[arg(long, env)]
    host: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", env)]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    ftp_proxy::logging::init_dual_logging();

    let args = Args::parse();
    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            warn!(
                "Could not load {} ({}); using default configuration",
                args.config, e
            );
            Config::default()
        }
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(host) = args.host {
        config.listen.host = host;
    }

    let listen_addr = config.listen.addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!(
        "FTP proxy listening on {} → backend {}",
        listen_addr,
        config.server.display_name()
    );

    let buffer_size = BufferSize::try_new(config.relay.buffer_size)
        .context("relay.buffer_size must be non-zero")?;
    let pool = BufferPool::new(buffer_size, config.relay.buffer_count);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (client_stream, client_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Failed to accept client: {}", e);
                        continue;
                    }
                };
                debug!("Accepted client {}", client_addr);

                let config = config.clone();
                let pool = pool.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_client(client_stream, config, pool).await {
                        warn!("Client {} session ended with error: {:#}", client_addr, e);
                    }
                });
            }

            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Dial the backend and run one proxied control session to completion
async fn serve_client(client_stream: TcpStream, config: Config, pool: BufferPool) -> Result<()> {
    let backend_addr = config.server.addr();
    let connect_timeout =
        Duration::from_secs(ftp_proxy::constants::timeout::CONNECT_SECS);

    let backend_stream =
        tokio::time::timeout(connect_timeout, TcpStream::connect(&backend_addr))
            .await
            .with_context(|| format!("Timed out connecting to backend {}", backend_addr))?
            .with_context(|| format!("Failed to connect to backend {}", backend_addr))?;

    let mut session = ControlSession::new(
        client_stream,
        backend_stream,
        pool,
        config.relay.flags(),
        config.relay.round_timeout(),
    );
    let session_id = session.id();
    info!("Session {} → backend {}", session_id, config.server.display_name());

    session
        .relay_greeting()
        .await
        .context("Failed to relay backend greeting")?;

    match session.run().await {
        Ok(metrics) => {
            let (c2s, s2c) = metrics.as_tuple();
            debug!("Session {} done | ↑{}B ↓{}B", session_id, c2s, s2c);
            Ok(())
        }
        Err(e) if e.is_expected_shutdown(config.relay.ignore_eof) => Ok(()),
        Err(e) => {
            error!("Session {} terminated: {}", session_id, e);
            Err(e.into())
        }
    }
}

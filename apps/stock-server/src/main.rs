//! REST backend serving the stockroom resources from memory.
//!
//! Registers the dashboard's resource schemas, optionally seeds the store
//! from a JSON file and serves until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stockroom_api::{Router, Server, Store};
use stockroom_core::config::ServerConfig;
use stockroom_core::schema::register_builtin_schemas;
use stockroom_core::SchemaRegistry;
use tokio::signal;

/// Command-line arguments for the stockroom server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// JSON file with seed records, keyed by resource
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Bearer token required on every request
    #[arg(long)]
    token: Option<String>,

    /// Request body read timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        request_timeout_ms: args.request_timeout_ms,
        auth_token: args.token,
    };

    let registry = SchemaRegistry::new();
    register_builtin_schemas(&registry).context("Failed to register resource schemas")?;
    let store = Store::from_registry(&registry)?;
    if let Some(seed) = &args.seed {
        let records = store
            .load_seed_file(seed)
            .with_context(|| format!("Failed to seed from {}", seed.display()))?;
        tracing::info!(records, file = %seed.display(), "seed loaded");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid host or port")?;

    println!("Starting stockroom server...");
    println!("  Host: {}", config.host);
    println!("  Port: {}", config.port);
    println!("  Resources: {}", store.resources().join(", "));
    println!("  Request timeout: {} ms", config.request_timeout_ms);
    println!(
        "  Authentication: {}",
        if config.auth_token.is_some() { "bearer token" } else { "none" }
    );

    let router = Router::new(Arc::new(store), Arc::new(config));
    let server = Server::bind(addr, router)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server
        .serve_with_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl_c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;
    println!("\nShutting down server...");

    Ok(())
}

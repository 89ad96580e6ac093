//! Shoal storage node daemon
//!
//! Stores chunk replicas under a sharded directory, serves them over HTTP,
//! and reports to the coordinator via registration + heartbeats.

use clap::Parser;
use shoal_node::{router, CoordinatorLink, NodeState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(name = "shoal-node")]
#[command(about = "Shoal storage node daemon")]
#[command(version)]
struct Cli {
    /// Node ID (auto-generated if not specified)
    #[arg(long, default_value_t = uuid::Uuid::new_v4().to_string())]
    id: String,

    /// Port to listen on
    #[arg(long, default_value_t = 9001)]
    port: u16,

    /// Storage directory path
    #[arg(long, default_value = "./node-storage")]
    storage: PathBuf,

    /// Coordinator address
    #[arg(long, default_value = "localhost:8080")]
    coordinator: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let address = format!("localhost:{}", cli.port);

    info!(
        node_id = %cli.id,
        address = %address,
        storage = ?cli.storage,
        coordinator = %cli.coordinator,
        "Starting storage node"
    );

    let state = Arc::new(NodeState::open(cli.id, address.clone(), &cli.storage)?);

    // Register once, then keep heartbeating in the background
    let link = Arc::new(CoordinatorLink::new(state.clone(), cli.coordinator));
    {
        let link = link.clone();
        tokio::spawn(async move {
            link.register().await;
            link.run().await;
        });
    }

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Storage node listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Storage node shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

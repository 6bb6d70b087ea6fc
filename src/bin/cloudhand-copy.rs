//! `cloudhand-copy` HTTP host: receives storage notifications and copies each
//! uploaded object to the configured destination.

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use cloudhand::ReplicationConfig;
use cloudhand::gateway::{TriggerState, create_router_with_state};
use cloudhand::{ReplicationTrigger, build_object_store};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ReplicationConfig::from_env()?;
    config.validate()?;
    let addr = config.socket_addr();

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        provider = ?config.storage_provider,
        destination = %config.destination(),
        "cloudhand-copy starting"
    );

    let store = build_object_store(&config)?;
    let trigger = ReplicationTrigger::new(store, config.destination());
    let app = create_router_with_state(TriggerState::new(trigger));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("cloudhand-copy shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

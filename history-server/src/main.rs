use std::{env::var, sync::Arc};

use explorer_core::MemoryHistory;
use history_server::{ServerConfig, ServerError};
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let store = Arc::new(MemoryHistory::with_cap(config.history_cap));
    let listener = TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, cap = config.history_cap, "history server listening");

    axum::serve(listener, history_server::app_with(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
    }
    info!("shutting down");
}

/// `RUST_LOG` picks the filter (default `info`); `RUST_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let log_layer = match var("RUST_LOG_FORMAT").unwrap_or_default().as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).init();
}

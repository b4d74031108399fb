use std::path::PathBuf;

use minimal_api::config::Configuration;
use minimal_api::{app, initialize_state, telemetry};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let otlp = std::env::var("OTLP_ENDPOINT").ok();
    let tracer = telemetry::init(otlp.as_deref())?;

    let config = Configuration::default()
        .path(std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_default())
        .read()?;

    let state = initialize_state(config.clone()).await?;

    let listener = TcpListener::bind((config.address.as_str(), config.port)).await?;
    tracing::info!(
        name = %config.name,
        address = %listener.local_addr()?,
        "server started"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(provider) = tracer {
        provider.shutdown()?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}

// HTTP Server: Auth Mechanism Detector
//
// Serves POST/GET/DELETE /detect. Configuration comes from the environment;
// see AuthDetectConfig::from_env for the recognized variables.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kodegen_tools_authdetect::config::AuthDetectConfig;
use kodegen_tools_authdetect::server;
use kodegen_tools_authdetect::service::AuthDetectService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AuthDetectConfig::from_env().context("Failed to load configuration")?;
    let address = config.bind_address();

    let service = Arc::new(AuthDetectService::new(config.clone()).context("Failed to build service")?);
    let background = service.start_background_tasks();

    let app = server::router(Arc::clone(&service), &config);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(
        address = %address,
        ai = service.detector().has_model(),
        "Auth detection service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;

    service.shutdown().await;
    for task in background {
        let _ = task.await;
    }
    info!("Shutdown complete");
    Ok(())
}

use anyhow::Context;
use waitlist_server::config::Settings;
use waitlist_server::persistence::ConnectionManager;
use waitlist_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!("Starting waitlist server");

    let settings = Settings::from_env();
    match &settings.database {
        Some(db) => tracing::info!(database = %db.database_name, "Durable storage configured"),
        None => tracing::warn!("WAITLIST_DATABASE_URL not set; signups will be kept in memory"),
    }

    let connections = ConnectionManager::new(settings.database.clone());
    // Warm the connection; failure just means starting in degraded mode.
    connections.ensure_connected().await;

    let app = build_router(AppState::new(connections));

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    tracing::info!("Server listening on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

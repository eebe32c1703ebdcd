/// GroupWarden - moderation engine daemon
///
/// Boots storage and background maintenance. The chat transport adapter is
/// provided by the embedding deployment; this binary keeps the durable
/// state healthy (schema, expired-sanction purge) and exposes the library
/// pipeline.
use groupwarden::{jobs, AppContext, WardenConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groupwarden=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = WardenConfig::from_env()?;
    info!(
        "GroupWarden v{} starting, database at {}",
        env!("CARGO_PKG_VERSION"),
        config.storage.database.display()
    );

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    info!("GroupWarden ready");

    // Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

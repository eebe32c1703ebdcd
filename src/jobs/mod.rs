use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background maintenance
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_sanction_purge_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Purge expired mutes and non-permanent bans
    async fn expired_sanction_purge_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.jobs.sanction_purge_interval_secs;
        let mut interval = interval(Duration::from_secs(period));

        loop {
            interval.tick().await;

            match tasks::purge_expired_sanctions(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Purged {} expired sanction records", count);
                    }
                }
                Err(e) => error!("Failed to purge expired sanctions: {}", e),
            }
        }
    }

    /// Periodic database connectivity check
    async fn health_check_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.jobs.health_check_interval_secs;
        let mut interval = interval(Duration::from_secs(period));

        loop {
            interval.tick().await;

            if let Err(e) = tasks::health_check(&scheduler.context).await {
                error!("Health check failed: {}", e);
            }
        }
    }
}

//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the daily
//! ingestion job.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<sitrep_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_ingest_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily ingestion job.
///
/// Runs every day at 06:30 UTC (`0 30 6 * * *`), after the morning news
/// cycle has filled the index pages.
async fn register_ingest_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<sitrep_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 30 6 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily ingestion run");
            run_ingest_job(&pool, &config).await;
            tracing::info!("scheduler: daily ingestion run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Run one ingestion batch and write whatever it produced.
async fn run_ingest_job(pool: &PgPool, config: &sitrep_core::AppConfig) {
    let ingest_config = sitrep_ingest::IngestConfig::from_app_config(config);

    let records = match sitrep_ingest::run_ingest(&ingest_config).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: ingestion run failed");
            return;
        }
    };

    if records.is_empty() {
        tracing::info!("scheduler: no event records assembled today");
        return;
    }

    let written = sitrep_db::write_events(pool, &records).await;
    tracing::info!(
        assembled = records.len(),
        written,
        "scheduler: event records written"
    );
}

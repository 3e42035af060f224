//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring listings-collection job.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Registers the recurring collection job and starts the scheduler. Returns
/// the running [`JobScheduler`] handle, which must be kept alive for the
/// lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<platemap_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_collect_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring listings-collection job.
///
/// The cron expression comes from `PLATEMAP_COLLECT_CRON` (default: every six
/// hours). Each run walks every configured area, fetches the platform's
/// current listings, and upserts them.
async fn register_collect_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<platemap_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let cron = config.collect_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting listings collection run");
            run_collect_job(&pool, &config).await;
            tracing::info!("scheduler: listings collection run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one collection run across all configured areas.
async fn run_collect_job(pool: &PgPool, config: &platemap_core::AppConfig) {
    let areas = match platemap_core::load_areas(&config.areas_path) {
        Ok(file) => file.areas,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load areas config");
            return;
        }
    };

    let client = match platemap_scraper::ListingsClient::new(
        &config.platform_base_url,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to build listings client");
            return;
        }
    };

    tracing::info!(count = areas.len(), "scheduler: collecting areas");

    for area in &areas {
        collect_area(pool, &client, config, area).await;
    }
}

/// Fetch, normalize, and upsert listings for a single area.
///
/// A fetch failure aborts this area only — the remaining areas still run. A
/// listing that fails normalization is skipped rather than failing the batch.
async fn collect_area(
    pool: &PgPool,
    client: &platemap_scraper::ListingsClient,
    config: &platemap_core::AppConfig,
    area: &platemap_core::AreaConfig,
) {
    let raw = match client
        .fetch_area(&area.slug, config.scraper_inter_request_delay_ms)
        .await
    {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!(area = %area.slug, error = %e, "scheduler: area fetch failed");
            return;
        }
    };

    let mut normalized = Vec::with_capacity(raw.len());
    for listing in raw {
        match platemap_scraper::normalize_restaurant(listing, &area.slug) {
            Ok(restaurant) => normalized.push(restaurant),
            Err(e) => {
                tracing::warn!(area = %area.slug, error = %e, "scheduler: skipping listing");
            }
        }
    }

    if normalized.is_empty() {
        tracing::warn!(area = %area.slug, "scheduler: no usable listings; skipping upsert");
        return;
    }

    match platemap_db::upsert_restaurants(pool, &normalized).await {
        Ok((new_count, updated_count)) => {
            tracing::info!(
                area = %area.slug,
                new = new_count,
                updated = updated_count,
                "scheduler: listings upserted"
            );
        }
        Err(e) => {
            tracing::error!(area = %area.slug, error = %e, "scheduler: upsert failed");
        }
    }
}

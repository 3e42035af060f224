//! The `collect` command: fetch current listings for every configured area
//! (or one area by slug) and upsert them through the normal ingestion path.

use anyhow::Context;

use platemap_core::{AppConfig, AreaConfig};
use platemap_scraper::ListingsClient;
use sqlx::PgPool;

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    area_filter: Option<&str>,
) -> anyhow::Result<()> {
    let areas = load_areas_for_collect(config, area_filter)?;

    let client = ListingsClient::new(
        &config.platform_base_url,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?;

    let mut failed_areas = 0usize;
    let mut total_new = 0u64;
    let mut total_updated = 0u64;

    for area in &areas {
        match collect_area(pool, &client, config, area).await {
            Ok((new_count, updated_count)) => {
                total_new += new_count;
                total_updated += updated_count;
            }
            Err(e) => {
                failed_areas += 1;
                tracing::error!(area = %area.slug, error = %format!("{e:#}"), "area collection failed");
            }
        }
    }

    println!(
        "collected {} area(s): {total_new} new, {total_updated} updated, {failed_areas} failed",
        areas.len()
    );

    if failed_areas == areas.len() {
        anyhow::bail!("every area failed to collect");
    }
    Ok(())
}

/// Resolve the area list for this run. A `--area` filter must name a
/// configured slug.
fn load_areas_for_collect(
    config: &AppConfig,
    area_filter: Option<&str>,
) -> anyhow::Result<Vec<AreaConfig>> {
    let file = platemap_core::load_areas(&config.areas_path)
        .with_context(|| format!("loading areas from {}", config.areas_path.display()))?;

    match area_filter {
        Some(slug) => {
            let area = file
                .areas
                .into_iter()
                .find(|a| a.slug == slug)
                .ok_or_else(|| anyhow::anyhow!("area '{slug}' is not in the areas config"))?;
            Ok(vec![area])
        }
        None => Ok(file.areas),
    }
}

/// Fetch, normalize, and upsert one area. Listings that fail normalization
/// are skipped with a warning rather than failing the batch.
async fn collect_area(
    pool: &PgPool,
    client: &ListingsClient,
    config: &AppConfig,
    area: &AreaConfig,
) -> anyhow::Result<(u64, u64)> {
    let raw = client
        .fetch_area(&area.slug, config.scraper_inter_request_delay_ms)
        .await
        .with_context(|| format!("fetching listings for area '{}'", area.slug))?;

    let mut normalized = Vec::with_capacity(raw.len());
    for listing in raw {
        match platemap_scraper::normalize_restaurant(listing, &area.slug) {
            Ok(restaurant) => normalized.push(restaurant),
            Err(e) => tracing::warn!(area = %area.slug, error = %e, "skipping listing"),
        }
    }

    let (new_count, updated_count) = platemap_db::upsert_restaurants(pool, &normalized)
        .await
        .with_context(|| format!("upserting listings for area '{}'", area.slug))?;

    tracing::info!(
        area = %area.slug,
        new = new_count,
        updated = updated_count,
        "area collected"
    );
    Ok((new_count, updated_count))
}

//! Write operations for the `restaurants` table.

use platemap_core::NormalizedRestaurant;
use sqlx::PgPool;

use crate::DbError;

/// Insert new restaurants and refresh existing ones, keyed on `external_id`.
///
/// Returns `(new_count, updated_count)` where:
/// - `new_count`: rows that did not exist before (were inserted)
/// - `updated_count`: rows that already existed (were refreshed)
///
/// Uses a single `INSERT … SELECT FROM UNNEST(…) ON CONFLICT` so the whole
/// batch is upserted in one round-trip regardless of batch size. `cuisines`
/// and `opening_hours` travel as `jsonb[]` because Postgres `UNNEST`
/// flattens nested arrays; the statement converts the cuisine lists back to
/// `text[]` per row.
///
/// `search_text` and `last_updated` are refreshed on every upsert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Encode`] if a
/// jsonb column cannot be encoded.
pub async fn upsert_restaurants(
    pool: &PgPool,
    restaurants: &[NormalizedRestaurant],
) -> Result<(u64, u64), DbError> {
    if restaurants.is_empty() {
        return Ok((0, 0));
    }

    // Collect each column into a parallel Vec for UNNEST binding.
    let mut external_ids: Vec<String> = Vec::with_capacity(restaurants.len());
    let mut names: Vec<String> = Vec::with_capacity(restaurants.len());
    let mut addresses: Vec<String> = Vec::with_capacity(restaurants.len());
    let mut areas: Vec<String> = Vec::with_capacity(restaurants.len());
    let mut latitudes: Vec<Option<f64>> = Vec::with_capacity(restaurants.len());
    let mut longitudes: Vec<Option<f64>> = Vec::with_capacity(restaurants.len());
    let mut cuisines: Vec<serde_json::Value> = Vec::with_capacity(restaurants.len());
    let mut price_levels: Vec<Option<i16>> = Vec::with_capacity(restaurants.len());
    let mut ratings: Vec<f64> = Vec::with_capacity(restaurants.len());
    let mut review_counts: Vec<i32> = Vec::with_capacity(restaurants.len());
    let mut photo_urls: Vec<Option<String>> = Vec::with_capacity(restaurants.len());
    let mut is_opens: Vec<bool> = Vec::with_capacity(restaurants.len());
    let mut opening_hours: Vec<serde_json::Value> = Vec::with_capacity(restaurants.len());
    let mut delivery_minutes: Vec<i32> = Vec::with_capacity(restaurants.len());
    let mut distance_kms: Vec<Option<f64>> = Vec::with_capacity(restaurants.len());
    let mut search_texts: Vec<String> = Vec::with_capacity(restaurants.len());

    for restaurant in restaurants {
        external_ids.push(restaurant.external_id.clone());
        names.push(restaurant.name.clone());
        addresses.push(restaurant.address.clone());
        areas.push(restaurant.area.clone());
        latitudes.push(restaurant.latitude);
        longitudes.push(restaurant.longitude);
        cuisines.push(serde_json::to_value(&restaurant.cuisines)?);
        price_levels.push(restaurant.price_level);
        ratings.push(restaurant.rating);
        review_counts.push(restaurant.review_count);
        photo_urls.push(restaurant.photo_url.clone());
        is_opens.push(restaurant.is_open);
        opening_hours.push(serde_json::to_value(&restaurant.opening_hours)?);
        delivery_minutes.push(restaurant.delivery_minutes);
        distance_kms.push(restaurant.distance_km);
        search_texts.push(restaurant.search_text());
    }

    let rows: Vec<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO restaurants \
             (external_id, name, address, area, latitude, longitude, cuisines, \
              price_level, rating, review_count, photo_url, is_open, \
              opening_hours, delivery_minutes, distance_km, search_text) \
         SELECT u.external_id, u.name, u.address, u.area, u.latitude, u.longitude, \
                ARRAY(SELECT jsonb_array_elements_text(u.cuisines)), \
                u.price_level, u.rating, u.review_count, u.photo_url, u.is_open, \
                u.opening_hours, u.delivery_minutes, u.distance_km, u.search_text \
         FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::float8[], $6::float8[], \
              $7::jsonb[], $8::int2[], $9::float8[], $10::int4[], $11::text[], $12::bool[], \
              $13::jsonb[], $14::int4[], $15::float8[], $16::text[]) \
           AS u(external_id, name, address, area, latitude, longitude, cuisines, \
                price_level, rating, review_count, photo_url, is_open, \
                opening_hours, delivery_minutes, distance_km, search_text) \
         ON CONFLICT (external_id) DO UPDATE SET \
             name             = EXCLUDED.name, \
             address          = EXCLUDED.address, \
             area             = EXCLUDED.area, \
             latitude         = EXCLUDED.latitude, \
             longitude        = EXCLUDED.longitude, \
             cuisines         = EXCLUDED.cuisines, \
             price_level      = EXCLUDED.price_level, \
             rating           = EXCLUDED.rating, \
             review_count     = EXCLUDED.review_count, \
             photo_url        = EXCLUDED.photo_url, \
             is_open          = EXCLUDED.is_open, \
             opening_hours    = EXCLUDED.opening_hours, \
             delivery_minutes = EXCLUDED.delivery_minutes, \
             distance_km      = EXCLUDED.distance_km, \
             search_text      = EXCLUDED.search_text, \
             last_updated     = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&external_ids)
    .bind(&names)
    .bind(&addresses)
    .bind(&areas)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&cuisines)
    .bind(&price_levels)
    .bind(&ratings)
    .bind(&review_counts)
    .bind(&photo_urls)
    .bind(&is_opens)
    .bind(&opening_hours)
    .bind(&delivery_minutes)
    .bind(&distance_kms)
    .bind(&search_texts)
    .fetch_all(pool)
    .await?;

    let new_count = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated_count = rows.len() as u64 - new_count;

    tracing::debug!(new = new_count, updated = updated_count, "restaurants upserted");

    Ok((new_count, updated_count))
}

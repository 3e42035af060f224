//! Read operations for the `restaurants` table.
//!
//! Both search paths share [`FILTER_CLAUSES`] — one null-skipped bind per
//! translated predicate — so the attribute path, the proximity path, and
//! their count queries can never disagree about which records match.

use platemap_core::filter::{Origin, Sort, SortKey};
use sqlx::PgPool;

use super::types::{RestaurantRow, SearchFilters};

const RESTAURANT_COLUMNS: &str = "id, external_id, name, address, area, latitude, longitude, \
     cuisines, price_level, rating, review_count, photo_url, is_open, \
     opening_hours, delivery_minutes, distance_km, last_updated, created_at";

/// Shared predicate clause. Binds `$1`..`$13` are the translated filters, in
/// [`SearchFilters`] field order; a `NULL` bind skips that predicate.
const FILTER_CLAUSES: &str =
    "($1::text IS NULL OR to_tsvector('simple', search_text) @@ plainto_tsquery('simple', $1)) \
     AND ($2::text IS NULL OR area = $2) \
     AND ($3::text[] IS NULL OR cuisines && $3) \
     AND ($4::float8 IS NULL OR rating >= $4) \
     AND ($5::float8 IS NULL OR rating <= $5) \
     AND ($6::float8 IS NULL OR rating = $6) \
     AND ($7::int8 IS NULL OR review_count >= $7) \
     AND ($8::int2 IS NULL OR price_level >= $8) \
     AND ($9::int2 IS NULL OR price_level <= $9) \
     AND ($10::int2 IS NULL OR price_level = $10) \
     AND ($11::int4 IS NULL OR delivery_minutes <= $11) \
     AND ($12::float8 IS NULL OR distance_km >= $12) \
     AND ($13::float8 IS NULL OR distance_km <= $13)";

/// Geospatial candidate clause for the proximity path. The `earth_box`
/// pre-filter engages the GiST index; the exact `earth_distance` comparison
/// trims the box's corners. Binds: `$14` latitude, `$15` longitude, `$16`
/// radius in meters.
const PROXIMITY_CLAUSES: &str = "latitude IS NOT NULL AND longitude IS NOT NULL \
     AND earth_box(ll_to_earth($14, $15), $16) @> ll_to_earth(latitude, longitude) \
     AND earth_distance(ll_to_earth(latitude, longitude), ll_to_earth($14, $15)) <= $16";

/// Applies the 13 filter binds in [`FILTER_CLAUSES`] order.
macro_rules! bind_filters {
    ($query:expr, $f:expr) => {
        $query
            .bind($f.text.as_deref())
            .bind($f.area.as_deref())
            .bind($f.cuisines.as_deref())
            .bind($f.min_rating)
            .bind($f.max_rating)
            .bind($f.rating_exact)
            .bind($f.min_reviews)
            .bind($f.min_price)
            .bind($f.max_price)
            .bind($f.price_exact)
            .bind($f.max_delivery_minutes)
            .bind($f.min_stored_distance_km)
            .bind($f.max_stored_distance_km)
    };
}

/// Attribute-path search: all translated predicates pushed to the store in a
/// single statement, with sort, limit, and offset.
///
/// When a text filter is active, relevance rank takes sort priority and the
/// requested key becomes the tiebreaker. `id` is the final tiebreaker so
/// pagination is stable under equal keys.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_restaurants(
    pool: &PgPool,
    filters: &SearchFilters,
    sort: Sort,
    limit: i64,
    offset: i64,
) -> Result<Vec<RestaurantRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {RESTAURANT_COLUMNS}, NULL::float8 AS distance_m \
         FROM restaurants \
         WHERE {FILTER_CLAUSES} \
         ORDER BY {order} \
         LIMIT $14 OFFSET $15",
        order = order_clause(sort, filters.text.is_some()),
    );

    bind_filters!(sqlx::query_as::<_, RestaurantRow>(&sql), filters)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Count query for the attribute path, using the identical predicate set as
/// [`search_restaurants`] so totals and page contents cannot diverge.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_restaurants(
    pool: &PgPool,
    filters: &SearchFilters,
) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM restaurants WHERE {FILTER_CLAUSES}");

    bind_filters!(sqlx::query_scalar::<_, i64>(&sql), filters)
        .fetch_one(pool)
        .await
}

/// Proximity-path search: nearest-neighbor order from the origin, bounded by
/// the origin's radius, with the non-geospatial predicates applied inside the
/// same statement — never as a separate post-filter step.
///
/// Each row carries `distance_m`, the geodesic distance in meters.
///
/// Records missing either coordinate are excluded.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_restaurants_nearby(
    pool: &PgPool,
    origin: &Origin,
    filters: &SearchFilters,
    limit: i64,
    offset: i64,
) -> Result<Vec<RestaurantRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {RESTAURANT_COLUMNS}, \
                earth_distance(ll_to_earth(latitude, longitude), ll_to_earth($14, $15)) AS distance_m \
         FROM restaurants \
         WHERE {PROXIMITY_CLAUSES} \
           AND {FILTER_CLAUSES} \
         ORDER BY distance_m ASC, id ASC \
         LIMIT $17 OFFSET $18",
    );

    bind_filters!(sqlx::query_as::<_, RestaurantRow>(&sql), filters)
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(origin.max_distance_m)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Count query for the proximity path — structurally identical to
/// [`search_restaurants_nearby`] minus the pagination slice.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_restaurants_nearby(
    pool: &PgPool,
    origin: &Origin,
    filters: &SearchFilters,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM restaurants WHERE {PROXIMITY_CLAUSES} AND {FILTER_CLAUSES}"
    );

    bind_filters!(sqlx::query_scalar::<_, i64>(&sql), filters)
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(origin.max_distance_m)
        .fetch_one(pool)
        .await
}

/// Look up one restaurant by its platform identity.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_restaurant_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<RestaurantRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {RESTAURANT_COLUMNS}, NULL::float8 AS distance_m \
         FROM restaurants WHERE external_id = $1"
    );

    sqlx::query_as::<_, RestaurantRow>(&sql)
        .bind(external_id)
        .fetch_optional(pool)
        .await
}

fn order_clause(sort: Sort, has_text: bool) -> String {
    let key = match sort.key {
        SortKey::Rating => "rating",
        SortKey::ReviewCount => "review_count",
        SortKey::PriceLevel => "price_level",
        SortKey::DeliveryTime => "delivery_minutes",
        SortKey::Name => "name",
    };
    let direction = if sort.descending { "DESC" } else { "ASC" };

    if has_text {
        // Relevance first; the requested key breaks ties among equal ranks.
        format!(
            "ts_rank(to_tsvector('simple', search_text), plainto_tsquery('simple', $1)) DESC, \
             {key} {direction}, id ASC"
        )
    } else {
        format!("{key} {direction}, id ASC")
    }
}

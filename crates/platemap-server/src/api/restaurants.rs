use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use platemap_core::filter::{compile, compile_nearby, RawNearbyParams, RawSearchParams};
use platemap_core::OpeningHours;
use platemap_db::RestaurantRow;

use crate::engine;

use super::{ApiError, AppState, SearchResponse};

/// One restaurant in an API response, in the platform's camelCase shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RestaurantItem {
    id: String,
    name: String,
    address: String,
    area: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    cuisines: Vec<String>,
    price_level: Option<i16>,
    rating: f64,
    review_count: i32,
    photo_url: Option<String>,
    is_open: bool,
    opening_hours: OpeningHours,
    estimated_delivery_time: i32,
    /// Live geodesic distance on the proximity path; otherwise the stored
    /// scrape-time snapshot, when present.
    distance_in_km: Option<f64>,
    last_updated: DateTime<Utc>,
}

impl From<RestaurantRow> for RestaurantItem {
    fn from(row: RestaurantRow) -> Self {
        let distance_in_km = row.distance_m.map(|m| m / 1000.0).or(row.distance_km);
        Self {
            id: row.external_id,
            name: row.name,
            address: row.address,
            area: row.area,
            latitude: row.latitude,
            longitude: row.longitude,
            cuisines: row.cuisines,
            price_level: row.price_level,
            rating: row.rating,
            review_count: row.review_count,
            photo_url: row.photo_url,
            is_open: row.is_open,
            opening_hours: row.opening_hours.0,
            estimated_delivery_time: row.delivery_minutes,
            distance_in_km,
            last_updated: row.last_updated,
        }
    }
}

/// `GET /api/restaurants` — attribute-path listing with optional filters.
pub(super) async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<RawSearchParams>,
) -> Json<SearchResponse<RestaurantItem>> {
    let spec = compile(&params);
    let outcome = engine::execute(&state.pool, &spec, Utc::now()).await;
    Json(SearchResponse::new(outcome, spec.pagination))
}

/// `GET /api/restaurants/search` — text search; `q` is required.
pub(super) async fn search_restaurants(
    State(state): State<AppState>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<SearchResponse<RestaurantItem>>, ApiError> {
    if params.q.as_deref().is_none_or(|q| q.trim().is_empty()) {
        return Err(ApiError::new(
            "validation_error",
            "query parameter \"q\" is required",
        ));
    }

    let spec = compile(&params);
    let outcome = engine::execute(&state.pool, &spec, Utc::now()).await;
    Ok(Json(SearchResponse::new(outcome, spec.pagination)))
}

/// `GET /api/restaurants/nearby` — proximity search; `latitude` and
/// `longitude` are required and must be in range.
pub(super) async fn nearby_restaurants(
    State(state): State<AppState>,
    Query(params): Query<RawNearbyParams>,
) -> Result<Json<SearchResponse<RestaurantItem>>, ApiError> {
    let latitude = parse_coordinate(params.latitude.as_deref(), 90.0).ok_or_else(|| {
        ApiError::new(
            "validation_error",
            "query parameter \"latitude\" is required and must be a number in [-90, 90]",
        )
    })?;
    let longitude = parse_coordinate(params.longitude.as_deref(), 180.0).ok_or_else(|| {
        ApiError::new(
            "validation_error",
            "query parameter \"longitude\" is required and must be a number in [-180, 180]",
        )
    })?;

    let spec = compile_nearby(&params, latitude, longitude);
    let outcome = engine::execute(&state.pool, &spec, Utc::now()).await;
    Ok(Json(SearchResponse::new(outcome, spec.pagination)))
}

/// `GET /api/restaurants/{external_id}` — single-record lookup.
pub(super) async fn get_restaurant(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<super::DetailResponse<RestaurantItem>>, ApiError> {
    match platemap_db::get_restaurant_by_external_id(&state.pool, &external_id).await {
        Ok(Some(row)) => Ok(Json(super::DetailResponse {
            success: true,
            data: RestaurantItem::from(row),
        })),
        Ok(None) => Err(ApiError::new("not_found", "restaurant not found")),
        Err(e) => {
            tracing::error!(error = %e, external_id, "restaurant lookup failed");
            Err(ApiError::new("internal_error", "database query failed"))
        }
    }
}

/// Strict coordinate parse: unlike the lenient filter parsers, a missing or
/// malformed coordinate is a client error, not a dropped filter.
fn parse_coordinate(raw: Option<&str>, bound: f64) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && v.abs() <= bound)
}

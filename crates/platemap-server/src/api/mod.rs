mod restaurants;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::engine::SearchOutcome;
use crate::middleware::request_id;
use platemap_core::filter::Pagination;
use platemap_db::RestaurantRow;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

/// The list-endpoint envelope: items plus pagination bookkeeping.
#[derive(Debug, Serialize)]
pub struct SearchResponse<T: Serialize> {
    pub success: bool,
    /// Number of items on this page.
    pub count: usize,
    pub pagination: PaginationMeta,
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Total matches across all pages.
    pub total: i64,
    pub page: i64,
    /// Total page count: `ceil(total / limit)`.
    pub pages: i64,
    pub limit: i64,
}

/// Single-record envelope.
#[derive(Debug, Serialize)]
pub struct DetailResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    success: bool,
    status: &'static str,
    database: &'static str,
}

impl<T: Serialize + From<RestaurantRow>> SearchResponse<T> {
    pub(super) fn new(outcome: SearchOutcome, pagination: Pagination) -> Self {
        let data: Vec<T> = outcome.restaurants.into_iter().map(T::from).collect();
        Self {
            success: true,
            count: data.len(),
            pagination: PaginationMeta {
                total: outcome.total,
                page: pagination.page,
                pages: page_count(outcome.total, pagination.limit),
                limit: pagination.limit,
            },
            data,
        }
    }
}

/// `ceil(total / limit)`; zero matches means zero pages.
fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/restaurants", get(restaurants::list_restaurants))
        .route(
            "/api/restaurants/search",
            get(restaurants::search_restaurants),
        )
        .route(
            "/api/restaurants/nearby",
            get(restaurants::nearby_restaurants),
        )
        .route(
            "/api/restaurants/{external_id}",
            get(restaurants::get_restaurant),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match platemap_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                success: true,
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    success: false,
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::TimeZone;
    use chrono::Utc;
    use platemap_core::filter::{compile, compile_nearby, RawNearbyParams, RawSearchParams};
    use platemap_db::seed::seed_sample_restaurants;
    use tower::ServiceExt;

    #[test]
    fn page_count_is_ceil_of_total_over_limit() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(5, 2), 3);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("not_found", "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn get_json(
        app: Router,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_restaurants_returns_paginated_envelope(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants?limit=2&page=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 2);
        assert_eq!(json["pagination"]["total"], 5);
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["pages"], 3);
        assert_eq!(json["pagination"]["limit"], 2);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_restaurants_default_sort_is_rating_desc(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants").await;

        assert_eq!(status, StatusCode::OK);
        let ratings: Vec<f64> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .map(|r| r["rating"].as_f64().expect("rating"))
            .collect();
        assert_eq!(ratings, vec![4.5, 4.0, 3.5, 3.0, 2.5]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn malformed_filter_value_behaves_like_no_filter(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants?minRating=not-a-number").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 5);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_without_q_is_a_validation_error(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants/search").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_matches_name_tokens(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants/search?q=hummus").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .map(|r| r["name"].as_str().expect("name"))
            .collect();
        assert_eq!(names, vec!["Hummus Haven"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn nearby_without_coordinates_is_a_validation_error(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants/nearby?longitude=34.77").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn nearby_orders_by_live_distance(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(
            app,
            "/api/restaurants/nearby?latitude=32.0560&longitude=34.7660",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .map(|r| r["id"].as_str().expect("id"))
            .collect();
        // Within the default 2 km radius, nearest first.
        assert_eq!(ids, vec!["seed-1", "seed-3"]);

        let first = &json["data"][0];
        let distance = first["distanceInKm"].as_f64().expect("distanceInKm");
        assert!(distance < 0.1, "seed-1 is ~14 m from the anchor: {distance}");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_restaurant_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants/does-not-exist").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_restaurant_returns_camel_case_record(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/restaurants/seed-4").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "seed-4");
        assert_eq!(json["data"]["reviewCount"], 510);
        assert_eq!(json["data"]["estimatedDeliveryTime"], 35);
        assert_eq!(json["data"]["openingHours"]["wed"], "12:00-17:00");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_with_live_pool(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, json) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], "ok");
    }

    // -------------------------------------------------------------------------
    // Engine — open-now behavior with an injected clock
    // -------------------------------------------------------------------------

    // 2026-08-26 is a Wednesday; the seed fixtures open Sun-Thu.
    fn wednesday_at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, hour, 0, 0).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn open_now_counts_only_open_restaurants(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let params = RawSearchParams {
            open_now: Some("true".to_string()),
            ..RawSearchParams::default()
        };
        let spec = compile(&params);

        // At 10:00 only Hummus Haven (08:00-22:00) and Green Bowl
        // (09:00-21:00) are open.
        let outcome = crate::engine::execute(&pool, &spec, wednesday_at(10)).await;
        assert_eq!(outcome.total, 2);
        let ids: Vec<&str> = outcome
            .restaurants
            .iter()
            .map(|r| r.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["seed-1", "seed-5"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn open_now_on_a_closed_day_is_empty_with_zero_total(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let params = RawSearchParams {
            open_now: Some("true".to_string()),
            ..RawSearchParams::default()
        };
        let spec = compile(&params);

        // 2026-08-28 is a Friday; every seed fixture is closed.
        let friday_noon = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let outcome = crate::engine::execute(&pool, &spec, friday_noon).await;
        assert_eq!(outcome.total, 0);
        assert!(outcome.restaurants.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn open_now_applies_on_the_proximity_path_too(pool: sqlx::PgPool) {
        seed_sample_restaurants(&pool).await.expect("seed");

        let params = RawNearbyParams {
            open_now: Some("true".to_string()),
            ..RawNearbyParams::default()
        };
        let spec = compile_nearby(&params, 32.0560, 34.7660);

        // Burger Yard (11:00-23:00) is inside the radius but still closed at
        // 10:00, so only Hummus Haven survives the post-filter.
        let outcome = crate::engine::execute(&pool, &spec, wednesday_at(10)).await;
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.restaurants[0].external_id, "seed-1");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn execute_degrades_to_empty_result_when_storage_fails(pool: sqlx::PgPool) {
        pool.close().await;

        let spec = compile(&RawSearchParams::default());
        let outcome = crate::engine::execute(&pool, &spec, wednesday_at(10)).await;
        assert_eq!(outcome.total, 0);
        assert!(outcome.restaurants.is_empty());
    }
}

//! Integration tests for platemap-db queries.
//!
//! Database tests use `#[sqlx::test]` with the workspace migrations; each
//! test gets its own freshly-migrated database.

use platemap_core::filter::{compile, compile_nearby, Origin, RawNearbyParams, RawSearchParams, Sort};
use platemap_db::{
    count_restaurants, count_restaurants_nearby, search_restaurants, search_restaurants_nearby,
    seed, upsert_restaurants, PoolConfig, SearchFilters,
};
use sqlx::PgPool;

fn no_filters() -> SearchFilters {
    SearchFilters::default()
}

fn filters_from(pairs: &[(&str, &str)]) -> SearchFilters {
    let mut p = RawSearchParams::default();
    for (key, value) in pairs {
        let value = Some((*value).to_string());
        match *key {
            "q" => p.q = value,
            "area" => p.area = value,
            "cuisines" => p.cuisines = value,
            "minRating" => p.min_rating = value,
            "maxRating" => p.max_rating = value,
            "minReviews" => p.min_reviews = value,
            "deliveryUnder30" => p.delivery_under30 = value,
            other => panic!("unknown param {other}"),
        }
    }
    SearchFilters::from_spec(&compile(&p))
}

#[test]
fn pool_config_from_env_defaults_without_vars() {
    let config = PoolConfig::default();
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.min_connections, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_is_idempotent_on_external_id(pool: PgPool) {
    let restaurants = seed::sample_restaurants();

    let (new_count, updated_count) = upsert_restaurants(&pool, &restaurants)
        .await
        .expect("first upsert");
    assert_eq!(new_count, 5);
    assert_eq!(updated_count, 0);

    // Re-scrape: same identities, so everything updates and nothing is new.
    let (new_count, updated_count) = upsert_restaurants(&pool, &restaurants)
        .await
        .expect("second upsert");
    assert_eq!(new_count, 0);
    assert_eq!(updated_count, 5);

    let total = count_restaurants(&pool, &no_filters())
        .await
        .expect("count");
    assert_eq!(total, 5);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_refreshes_changed_fields(pool: PgPool) {
    let mut restaurants = seed::sample_restaurants();
    upsert_restaurants(&pool, &restaurants)
        .await
        .expect("seed upsert");

    restaurants[0].rating = 1.5;
    restaurants[0].name = "Hummus Haven Renamed".to_string();
    upsert_restaurants(&pool, &restaurants[..1])
        .await
        .expect("refresh upsert");

    let row = platemap_db::get_restaurant_by_external_id(&pool, "seed-1")
        .await
        .expect("lookup")
        .expect("row exists");
    assert_eq!(row.name, "Hummus Haven Renamed");
    assert!((row.rating - 1.5).abs() < f64::EPSILON);
    // The refreshed name must be searchable.
    assert!(row.cuisines.contains(&"Vegan".to_string()));
}

#[sqlx::test(migrations = "../../migrations")]
async fn count_matches_filtered_result_set(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    // deliveryUnder30 + minRating=3.5 → exactly the 4.5 and 3.5 seeds.
    let filters = filters_from(&[("deliveryUnder30", "true"), ("minRating", "3.5")]);

    let rows = search_restaurants(&pool, &filters, Sort::default(), 20, 0)
        .await
        .expect("search");
    let total = count_restaurants(&pool, &filters).await.expect("count");

    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);
    let ids: Vec<&str> = rows.iter().map(|r| r.external_id.as_str()).collect();
    assert_eq!(ids, vec!["seed-1", "seed-5"], "descending rating order");
}

#[sqlx::test(migrations = "../../migrations")]
async fn default_sort_is_descending_rating(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let rows = search_restaurants(&pool, &no_filters(), Sort::default(), 20, 0)
        .await
        .expect("search");
    let ratings: Vec<f64> = rows.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![4.5, 4.0, 3.5, 3.0, 2.5]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn pagination_slices_the_sorted_set(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    // Page 2 of limit 2 → records 3–4 in sort order.
    let rows = search_restaurants(&pool, &no_filters(), Sort::default(), 2, 2)
        .await
        .expect("search");
    let ratings: Vec<f64> = rows.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![3.5, 3.0]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn area_filter_is_exact_match(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let filters = filters_from(&[("area", "Florentin")]);
    let total = count_restaurants(&pool, &filters).await.expect("count");
    assert_eq!(total, 2);

    let filters = filters_from(&[("area", "florentin")]);
    let total = count_restaurants(&pool, &filters).await.expect("count");
    assert_eq!(total, 0, "area match is case-sensitive exact");
}

#[sqlx::test(migrations = "../../migrations")]
async fn cuisine_membership_matches_any_listed_value(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let filters = filters_from(&[("cuisines", "Vegan,Sushi")]);
    let rows = search_restaurants(&pool, &filters, Sort::default(), 20, 0)
        .await
        .expect("search");
    let mut ids: Vec<&str> = rows.iter().map(|r| r.external_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["seed-1", "seed-4", "seed-5"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn text_search_matches_name_and_cuisines(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let filters = filters_from(&[("q", "sushi")]);
    let rows = search_restaurants(&pool, &filters, Sort::default(), 20, 0)
        .await
        .expect("search");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].external_id, "seed-4");

    let filters = filters_from(&[("q", "hummus")]);
    let total = count_restaurants(&pool, &filters).await.expect("count");
    assert_eq!(total, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn malformed_numeric_filter_equals_omitting_it(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let malformed = filters_from(&[("minRating", "invalid")]);
    let omitted = no_filters();

    let with_malformed = count_restaurants(&pool, &malformed).await.expect("count");
    let without = count_restaurants(&pool, &omitted).await.expect("count");
    assert_eq!(with_malformed, without);
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_orders_by_distance_within_radius(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    // Anchor in Florentin; 2km radius covers the two Florentin seeds only.
    let origin = Origin {
        latitude: 32.0560,
        longitude: 34.7660,
        max_distance_m: 2000.0,
    };

    let rows = search_restaurants_nearby(&pool, &origin, &no_filters(), 20, 0)
        .await
        .expect("nearby search");
    let total = count_restaurants_nearby(&pool, &origin, &no_filters())
        .await
        .expect("nearby count");

    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].external_id, "seed-1", "nearest first");
    assert_eq!(rows[1].external_id, "seed-3");

    let mut last_distance = 0.0;
    for row in &rows {
        let distance = row.distance_m.expect("distance projection");
        assert!(distance >= last_distance, "non-decreasing distance order");
        assert!(distance <= origin.max_distance_m, "within radius");
        last_distance = distance;
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_applies_attribute_filters_inside_the_scan(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let origin = Origin {
        latitude: 32.0560,
        longitude: 34.7660,
        max_distance_m: 2000.0,
    };
    // Within the radius, only Hummus Haven has rating >= 3.
    let raw = RawNearbyParams {
        min_rating: Some("3".to_string()),
        ..RawNearbyParams::default()
    };
    let filters = SearchFilters::from_spec(&compile_nearby(&raw, origin.latitude, origin.longitude));

    let rows = search_restaurants_nearby(&pool, &origin, &filters, 20, 0)
        .await
        .expect("nearby search");
    let total = count_restaurants_nearby(&pool, &origin, &filters)
        .await
        .expect("nearby count");

    assert_eq!(total, 1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].external_id, "seed-1");
}

#[sqlx::test(migrations = "../../migrations")]
async fn nearby_excludes_records_without_coordinates(pool: PgPool) {
    let mut restaurants = seed::sample_restaurants();
    restaurants[0].latitude = None;
    restaurants[0].longitude = None;
    upsert_restaurants(&pool, &restaurants).await.expect("seed");

    let origin = Origin {
        latitude: 32.0560,
        longitude: 34.7660,
        max_distance_m: 2000.0,
    };
    let rows = search_restaurants_nearby(&pool, &origin, &no_filters(), 20, 0)
        .await
        .expect("nearby search");
    assert!(
        rows.iter().all(|r| r.external_id != "seed-1"),
        "coordinate-less record must be excluded from geospatial queries"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn lookup_by_external_id(pool: PgPool) {
    seed::seed_sample_restaurants(&pool).await.expect("seed");

    let row = platemap_db::get_restaurant_by_external_id(&pool, "seed-4")
        .await
        .expect("lookup")
        .expect("row exists");
    assert_eq!(row.name, "Sushi Dock");
    assert_eq!(row.opening_hours.0.wed.as_deref(), Some("12:00-17:00"));
    assert!(row.distance_m.is_none(), "attribute reads carry no projection");

    let missing = platemap_db::get_restaurant_by_external_id(&pool, "no-such-id")
        .await
        .expect("lookup");
    assert!(missing.is_none());
}

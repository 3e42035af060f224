//! Development seed data.
//!
//! A small fixed set of Tel Aviv restaurants, inserted through the normal
//! upsert path so seeding is idempotent.

use platemap_core::{NormalizedRestaurant, OpeningHours};
use sqlx::PgPool;

use crate::DbError;

fn weekdays(raw: &str) -> OpeningHours {
    OpeningHours {
        sun: Some(raw.to_string()),
        mon: Some(raw.to_string()),
        tue: Some(raw.to_string()),
        wed: Some(raw.to_string()),
        thu: Some(raw.to_string()),
        fri: Some("Closed".to_string()),
        sat: Some("Closed".to_string()),
        displayed_hours: Some(format!("Sun-Thu {raw}")),
    }
}

#[allow(clippy::too_many_arguments)]
fn restaurant(
    external_id: &str,
    name: &str,
    area: &str,
    coords: (f64, f64),
    cuisines: &[&str],
    rating: f64,
    review_count: i32,
    delivery_minutes: i32,
    hours: OpeningHours,
) -> NormalizedRestaurant {
    NormalizedRestaurant {
        external_id: external_id.to_string(),
        name: name.to_string(),
        address: format!("{name} St 1, Tel Aviv"),
        area: area.to_string(),
        latitude: Some(coords.0),
        longitude: Some(coords.1),
        cuisines: cuisines.iter().map(ToString::to_string).collect(),
        price_level: Some(2),
        rating,
        review_count,
        photo_url: None,
        is_open: true,
        opening_hours: hours,
        delivery_minutes,
        distance_km: None,
    }
}

/// Fixed sample listings used by `platemap-cli seed` and the test suite.
#[must_use]
pub fn sample_restaurants() -> Vec<NormalizedRestaurant> {
    vec![
        restaurant(
            "seed-1",
            "Hummus Haven",
            "Florentin",
            (32.0561, 34.7661),
            &["Middle Eastern", "Vegan"],
            4.5,
            320,
            25,
            weekdays("08:00-22:00"),
        ),
        restaurant(
            "seed-2",
            "Pasta Lane",
            "Old North",
            (32.0870, 34.7740),
            &["Italian"],
            3.0,
            85,
            45,
            weekdays("12:00-23:00"),
        ),
        restaurant(
            "seed-3",
            "Burger Yard",
            "Florentin",
            (32.0555, 34.7702),
            &["Burgers", "American"],
            2.5,
            40,
            20,
            weekdays("11:00-23:00"),
        ),
        restaurant(
            "seed-4",
            "Sushi Dock",
            "Port",
            (32.0969, 34.7741),
            &["Japanese", "Sushi"],
            4.0,
            510,
            35,
            weekdays("12:00-17:00"),
        ),
        restaurant(
            "seed-5",
            "Green Bowl",
            "Old North",
            (32.0841, 34.7805),
            &["Salads", "Vegan"],
            3.5,
            150,
            30,
            weekdays("09:00-21:00"),
        ),
    ]
}

/// Upsert the sample listings.
///
/// # Errors
///
/// Returns [`DbError`] if the upsert fails.
pub async fn seed_sample_restaurants(pool: &PgPool) -> Result<(u64, u64), DbError> {
    crate::upsert_restaurants(pool, &sample_restaurants()).await
}

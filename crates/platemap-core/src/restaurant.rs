use serde::{Deserialize, Serialize};

use crate::hours::OpeningHours;

/// A restaurant listing scraped from the delivery platform, normalized for
/// storage.
///
/// `external_id` is the platform's stable identifier and the idempotent
/// upsert key. Coordinates are `None` when the platform record is missing
/// either component or carries an out-of-range value — such records are
/// stored but excluded from geospatial queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRestaurant {
    pub external_id: String,
    pub name: String,
    pub address: String,
    /// Coarse neighborhood label, e.g. `"Florentin"`.
    pub area: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cuisines: Vec<String>,
    pub price_level: Option<i16>,
    /// 0–5 platform rating.
    pub rating: f64,
    pub review_count: i32,
    pub photo_url: Option<String>,
    /// Scrape-time open/closed snapshot from the platform. Not authoritative
    /// for the live open-now predicate.
    pub is_open: bool,
    pub opening_hours: OpeningHours,
    /// Estimated delivery time in minutes.
    pub delivery_minutes: i32,
    /// Scrape-time distance snapshot in kilometers, when the platform
    /// supplies one.
    pub distance_km: Option<f64>,
}

impl NormalizedRestaurant {
    /// Concatenated text backing the full-text search index: name, address,
    /// area, and cuisine tags.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.name, &self.address, &self.area];
        parts.extend(self.cuisines.iter().map(String::as_str));
        parts.retain(|s| !s.is_empty());
        parts.join(" ")
    }
}

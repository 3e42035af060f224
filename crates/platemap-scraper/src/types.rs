//! Raw wire types for the delivery platform's listings API.
//!
//! These structs mirror the platform's JSON exactly (camelCase fields,
//! optional everything the platform sometimes omits). Conversion to the
//! storage shape lives in [`crate::normalize`].

use serde::Deserialize;

/// One page of the platform's area-listings response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformListingsResponse {
    #[serde(default)]
    pub restaurants: Vec<PlatformRestaurant>,
    pub page: u32,
    pub total_pages: u32,
}

/// A raw restaurant record as the platform emits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRestaurant {
    /// The platform's numeric identifier; stringified into `external_id`.
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Neighborhood label, when the platform supplies one.
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub cuisine_types: Vec<String>,
    /// Price tier, 1–4.
    #[serde(default)]
    pub price_range: Option<i16>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_open_now: Option<bool>,
    #[serde(default)]
    pub opening_hours: Option<PlatformOpeningHours>,
    /// Estimated delivery time in minutes.
    #[serde(default)]
    pub estimated_delivery_time: Option<i64>,
    /// Distance snapshot in kilometers from the platform's own reference point.
    #[serde(default)]
    pub distance_in_km: Option<f64>,
}

/// Weekly hours object nested inside a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOpeningHours {
    #[serde(default)]
    pub sun: Option<String>,
    #[serde(default)]
    pub mon: Option<String>,
    #[serde(default)]
    pub tue: Option<String>,
    #[serde(default)]
    pub wed: Option<String>,
    #[serde(default)]
    pub thu: Option<String>,
    #[serde(default)]
    pub fri: Option<String>,
    #[serde(default)]
    pub sat: Option<String>,
    #[serde(default)]
    pub displayed_hours: Option<String>,
}

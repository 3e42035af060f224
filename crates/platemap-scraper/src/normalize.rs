//! Normalization from raw platform types to [`platemap_core::NormalizedRestaurant`].
//!
//! The platform's records are loosely typed and occasionally incomplete; this
//! module flattens them into the storage shape, dropping or clamping values
//! that would violate the database's constraints.

use platemap_core::{NormalizedRestaurant, OpeningHours};

use crate::error::ScraperError;
use crate::types::{PlatformOpeningHours, PlatformRestaurant};

/// Normalizes a raw [`PlatformRestaurant`] into a [`NormalizedRestaurant`].
///
/// `area_slug` is the area the listing was fetched under; it becomes the
/// stored area when the record carries no neighborhood of its own.
///
/// Lossy rules:
/// - Coordinates are kept only when both components are present and in
///   range (lat ±90, lon ±180); otherwise both are dropped.
/// - Rating is clamped to 0–5; review count and delivery minutes floor at 0.
/// - Missing opening hours become an empty week (every day closed).
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the listing's name is empty
/// after trimming.
pub fn normalize_restaurant(
    raw: PlatformRestaurant,
    area_slug: &str,
) -> Result<NormalizedRestaurant, ScraperError> {
    let external_id = raw.id.to_string();

    let name = raw.name.trim().to_owned();
    if name.is_empty() {
        return Err(ScraperError::Normalization {
            external_id,
            reason: "listing has no name".into(),
        });
    }

    let (latitude, longitude) = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lon))
            if lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon) =>
        {
            (Some(lat), Some(lon))
        }
        _ => (None, None),
    };

    let area = raw
        .neighborhood
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| area_slug.to_owned(), str::to_owned);

    let rating = raw.rating.unwrap_or(0.0).clamp(0.0, 5.0);
    let review_count = i32::try_from(raw.review_count.unwrap_or(0).max(0)).unwrap_or(i32::MAX);
    let delivery_minutes =
        i32::try_from(raw.estimated_delivery_time.unwrap_or(0).max(0)).unwrap_or(i32::MAX);

    let price_level = raw.price_range.filter(|p| (1..=4).contains(p));

    let cuisines: Vec<String> = raw
        .cuisine_types
        .into_iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect();

    Ok(NormalizedRestaurant {
        external_id,
        name,
        address: raw.address.unwrap_or_default(),
        area,
        latitude,
        longitude,
        cuisines,
        price_level,
        rating,
        review_count,
        photo_url: raw.photo_url.filter(|u| !u.is_empty()),
        is_open: raw.is_open_now.unwrap_or(false),
        opening_hours: raw.opening_hours.map(convert_hours).unwrap_or_default(),
        delivery_minutes,
        distance_km: raw.distance_in_km.filter(|d| d.is_finite() && *d >= 0.0),
    })
}

fn convert_hours(raw: PlatformOpeningHours) -> OpeningHours {
    OpeningHours {
        sun: raw.sun,
        mon: raw.mon,
        tue: raw.tue,
        wed: raw.wed,
        thu: raw.thu,
        fri: raw.fri,
        sat: raw.sat,
        displayed_hours: raw.displayed_hours,
    }
}

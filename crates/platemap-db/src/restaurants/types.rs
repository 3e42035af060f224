//! Row and filter types for the `restaurants` table.

use chrono::{DateTime, Utc};
use platemap_core::filter::{Field, FilterSpec, Predicate, Scalar};
use platemap_core::OpeningHours;

/// A row from the `restaurants` table.
///
/// `distance_m` is a live geodesic projection populated only by proximity
/// queries; attribute-path queries select it as `NULL`. It is distinct from
/// `distance_km`, the scrape-time snapshot stored on the record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestaurantRow {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub area: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cuisines: Vec<String>,
    pub price_level: Option<i16>,
    pub rating: f64,
    pub review_count: i32,
    pub photo_url: Option<String>,
    pub is_open: bool,
    pub opening_hours: sqlx::types::Json<OpeningHours>,
    pub delivery_minutes: i32,
    pub distance_km: Option<f64>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub distance_m: Option<f64>,
}

/// Storage-level translation of a [`FilterSpec`]'s predicates.
///
/// Every field maps to one null-skipped bind in the shared filter clause, so
/// the attribute and proximity paths execute the exact same predicate set.
/// The open-now flag deliberately has no representation here — it is never a
/// storage-level predicate.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub text: Option<String>,
    pub area: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub rating_exact: Option<f64>,
    pub min_reviews: Option<i64>,
    pub min_price: Option<i16>,
    pub max_price: Option<i16>,
    pub price_exact: Option<i16>,
    pub max_delivery_minutes: Option<i32>,
    pub min_stored_distance_km: Option<f64>,
    pub max_stored_distance_km: Option<f64>,
}

impl SearchFilters {
    /// Translates the backend-agnostic predicates of `spec` into bindable
    /// columns. Predicates whose value does not fit the column type (e.g. a
    /// price level beyond `i16`) are dropped, matching the compiler's
    /// degrade-to-no-filter policy.
    #[must_use]
    pub fn from_spec(spec: &FilterSpec) -> Self {
        let mut filters = Self::default();

        for predicate in &spec.predicates {
            match predicate {
                Predicate::TextMatch(query) => filters.text = Some(query.clone()),
                Predicate::Equality { field, value } => match (field, value) {
                    (Field::Area, Scalar::Text(area)) => filters.area = Some(area.clone()),
                    (Field::Rating, Scalar::Float(rating)) => {
                        filters.rating_exact = Some(*rating);
                    }
                    (Field::PriceLevel, Scalar::Int(price)) => {
                        filters.price_exact = i16::try_from(*price).ok();
                    }
                    _ => {}
                },
                Predicate::Membership { field, values } => {
                    if *field == Field::Cuisines {
                        filters.cuisines = Some(values.clone());
                    }
                }
                Predicate::Range { field, min, max } => match field {
                    Field::Rating => {
                        filters.min_rating = float_of(min.as_ref());
                        filters.max_rating = float_of(max.as_ref());
                    }
                    Field::ReviewCount => filters.min_reviews = int_of(min.as_ref()),
                    Field::PriceLevel => {
                        filters.min_price =
                            int_of(min.as_ref()).and_then(|v| i16::try_from(v).ok());
                        filters.max_price =
                            int_of(max.as_ref()).and_then(|v| i16::try_from(v).ok());
                    }
                    Field::DeliveryMinutes => {
                        filters.max_delivery_minutes =
                            int_of(max.as_ref()).and_then(|v| i32::try_from(v).ok());
                    }
                    Field::StoredDistanceKm => {
                        filters.min_stored_distance_km = float_of(min.as_ref());
                        filters.max_stored_distance_km = float_of(max.as_ref());
                    }
                    Field::Area | Field::Cuisines => {}
                },
            }
        }

        filters
    }
}

fn float_of(scalar: Option<&Scalar>) -> Option<f64> {
    match scalar {
        Some(Scalar::Float(v)) => Some(*v),
        #[allow(clippy::cast_precision_loss)]
        Some(Scalar::Int(v)) => Some(*v as f64),
        _ => None,
    }
}

fn int_of(scalar: Option<&Scalar>) -> Option<i64> {
    match scalar {
        Some(Scalar::Int(v)) => Some(*v),
        _ => None,
    }
}

//! Filter compilation.
//!
//! Translates raw, user-supplied query parameters into a backend-agnostic
//! [`FilterSpec`]. Compilation never fails: a value that cannot be parsed
//! drops that single filter, so a malformed query degrades to "no filter"
//! instead of an error, and malformed values can never contaminate the
//! other filters of the same request.

use serde::Deserialize;

/// Default page size for search results.
pub const DEFAULT_LIMIT: i64 = 20;
/// Maximum page size a client may request.
pub const MAX_LIMIT: i64 = 100;
/// Default proximity-search radius in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 2000.0;
/// Radius ceiling in meters for proximity searches.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;

/// Raw query parameters for the attribute-search path.
///
/// Every field is an `Option<String>` so query-string deserialization itself
/// can never reject a request; all parsing happens leniently in [`compile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSearchParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub area: Option<String>,
    pub cuisine: Option<String>,
    pub cuisines: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
    pub rating: Option<String>,
    pub min_reviews: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub price_level: Option<String>,
    pub delivery_under30: Option<String>,
    pub open_now: Option<String>,
    pub min_distance: Option<String>,
    pub max_distance: Option<String>,
}

/// Raw query parameters for the proximity-search path.
///
/// `latitude`/`longitude` are validated by the handler before compilation —
/// they are the one place where a malformed value is a client error rather
/// than a dropped filter. The proximity endpoint accepts no free-text `q`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNearbyParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub max_distance: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub area: Option<String>,
    pub cuisine: Option<String>,
    pub cuisines: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
    pub rating: Option<String>,
    pub min_reviews: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub price_level: Option<String>,
    pub delivery_under30: Option<String>,
    pub open_now: Option<String>,
}

/// A filterable restaurant attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Area,
    Cuisines,
    Rating,
    ReviewCount,
    PriceLevel,
    DeliveryMinutes,
    /// The scrape-time `distance_km` snapshot, not the live geodesic distance.
    StoredDistanceKm,
}

/// A scalar comparison value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

/// One compiled predicate, independent of any particular query backend.
///
/// Both execution paths translate the same variants into their native query
/// forms, so the attribute and proximity paths cannot drift apart in filter
/// semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Full-text relevance match against name/cuisines/address/area.
    TextMatch(String),
    Equality {
        field: Field,
        value: Scalar,
    },
    Range {
        field: Field,
        min: Option<Scalar>,
        max: Option<Scalar>,
    },
    /// The record's value list must contain any of the given values.
    Membership {
        field: Field,
        values: Vec<String>,
    },
}

/// Sortable keys accepted by the `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Rating,
    ReviewCount,
    PriceLevel,
    DeliveryTime,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        // The platform's default browse order.
        Self {
            key: SortKey::Rating,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Row offset of the first record on this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Anchor coordinate and radius for the proximity path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in meters.
    pub max_distance_m: f64,
}

/// The compiled, backend-agnostic representation of one request's filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub predicates: Vec<Predicate>,
    /// When set, the open-now post-filter must run; this is never compiled
    /// into a storage-level predicate.
    pub open_now: bool,
    pub pagination: Pagination,
    pub sort: Sort,
    /// Present only on the proximity path.
    pub origin: Option<Origin>,
}

impl FilterSpec {
    /// Returns the compiled text query, if a `TextMatch` predicate is active.
    #[must_use]
    pub fn text_query(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::TextMatch(q) => Some(q.as_str()),
            _ => None,
        })
    }
}

/// Compiles attribute-path parameters into a [`FilterSpec`]. Never fails.
#[must_use]
pub fn compile(params: &RawSearchParams) -> FilterSpec {
    let mut predicates = Vec::new();

    if let Some(q) = non_empty(params.q.as_deref()) {
        predicates.push(Predicate::TextMatch(q));
    }

    push_shared_predicates(
        &mut predicates,
        SharedParams {
            area: params.area.as_deref(),
            cuisine: params.cuisine.as_deref(),
            cuisines: params.cuisines.as_deref(),
            min_rating: params.min_rating.as_deref(),
            max_rating: params.max_rating.as_deref(),
            rating: params.rating.as_deref(),
            min_reviews: params.min_reviews.as_deref(),
            min_price: params.min_price.as_deref(),
            max_price: params.max_price.as_deref(),
            price_level: params.price_level.as_deref(),
            delivery_under30: params.delivery_under30.as_deref(),
        },
    );

    // Bounds on the stored scrape-time distance snapshot. Only meaningful on
    // the attribute path; the proximity path reinterprets maxDistance as a
    // live search radius instead.
    let min_distance = parse_f64(params.min_distance.as_deref());
    let max_distance = parse_f64(params.max_distance.as_deref());
    if min_distance.is_some() || max_distance.is_some() {
        predicates.push(Predicate::Range {
            field: Field::StoredDistanceKm,
            min: min_distance.map(Scalar::Float),
            max: max_distance.map(Scalar::Float),
        });
    }

    FilterSpec {
        predicates,
        open_now: parse_flag(params.open_now.as_deref()),
        pagination: compile_pagination(params.page.as_deref(), params.limit.as_deref()),
        sort: compile_sort(params.sort.as_deref()),
        origin: None,
    }
}

/// Compiles proximity-path parameters into a [`FilterSpec`] anchored at the
/// given (already validated) coordinate. Never fails.
///
/// The proximity path takes no free-text query, and its `maxDistance` is the
/// search radius in meters rather than a stored-distance bound.
#[must_use]
pub fn compile_nearby(params: &RawNearbyParams, latitude: f64, longitude: f64) -> FilterSpec {
    let mut predicates = Vec::new();

    push_shared_predicates(
        &mut predicates,
        SharedParams {
            area: params.area.as_deref(),
            cuisine: params.cuisine.as_deref(),
            cuisines: params.cuisines.as_deref(),
            min_rating: params.min_rating.as_deref(),
            max_rating: params.max_rating.as_deref(),
            rating: params.rating.as_deref(),
            min_reviews: params.min_reviews.as_deref(),
            min_price: params.min_price.as_deref(),
            max_price: params.max_price.as_deref(),
            price_level: params.price_level.as_deref(),
            delivery_under30: params.delivery_under30.as_deref(),
        },
    );

    let max_distance_m = parse_f64(params.max_distance.as_deref())
        .filter(|&m| m > 0.0)
        .unwrap_or(DEFAULT_RADIUS_METERS)
        .min(MAX_RADIUS_METERS);

    FilterSpec {
        predicates,
        open_now: parse_flag(params.open_now.as_deref()),
        pagination: compile_pagination(params.page.as_deref(), params.limit.as_deref()),
        sort: Sort::default(),
        origin: Some(Origin {
            latitude,
            longitude,
            max_distance_m,
        }),
    }
}

/// Parameters shared by both paths, as raw strings.
struct SharedParams<'a> {
    area: Option<&'a str>,
    cuisine: Option<&'a str>,
    cuisines: Option<&'a str>,
    min_rating: Option<&'a str>,
    max_rating: Option<&'a str>,
    rating: Option<&'a str>,
    min_reviews: Option<&'a str>,
    min_price: Option<&'a str>,
    max_price: Option<&'a str>,
    price_level: Option<&'a str>,
    delivery_under30: Option<&'a str>,
}

fn push_shared_predicates(predicates: &mut Vec<Predicate>, params: SharedParams<'_>) {
    if let Some(area) = non_empty(params.area) {
        predicates.push(Predicate::Equality {
            field: Field::Area,
            value: Scalar::Text(area),
        });
    }

    let cuisines = split_cuisines(params.cuisine, params.cuisines);
    if !cuisines.is_empty() {
        predicates.push(Predicate::Membership {
            field: Field::Cuisines,
            values: cuisines,
        });
    }

    // An exact rating overrides any bounds supplied alongside it.
    if let Some(exact) = parse_f64(params.rating) {
        predicates.push(Predicate::Equality {
            field: Field::Rating,
            value: Scalar::Float(exact),
        });
    } else {
        let min = parse_f64(params.min_rating);
        let max = parse_f64(params.max_rating);
        if min.is_some() || max.is_some() {
            predicates.push(Predicate::Range {
                field: Field::Rating,
                min: min.map(Scalar::Float),
                max: max.map(Scalar::Float),
            });
        }
    }

    if let Some(min_reviews) = parse_i64(params.min_reviews) {
        predicates.push(Predicate::Range {
            field: Field::ReviewCount,
            min: Some(Scalar::Int(min_reviews)),
            max: None,
        });
    }

    // Same exact-overrides-bounds rule as rating.
    if let Some(exact) = parse_i64(params.price_level) {
        predicates.push(Predicate::Equality {
            field: Field::PriceLevel,
            value: Scalar::Int(exact),
        });
    } else {
        let min = parse_i64(params.min_price);
        let max = parse_i64(params.max_price);
        if min.is_some() || max.is_some() {
            predicates.push(Predicate::Range {
                field: Field::PriceLevel,
                min: min.map(Scalar::Int),
                max: max.map(Scalar::Int),
            });
        }
    }

    if parse_flag(params.delivery_under30) {
        predicates.push(Predicate::Range {
            field: Field::DeliveryMinutes,
            min: None,
            max: Some(Scalar::Int(30)),
        });
    }
}

fn compile_pagination(page: Option<&str>, limit: Option<&str>) -> Pagination {
    let page = parse_i64(page).filter(|&p| p >= 1).unwrap_or(1);
    let limit = parse_i64(limit)
        .map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT));
    Pagination { page, limit }
}

fn compile_sort(raw: Option<&str>) -> Sort {
    let Some(raw) = non_empty(raw) else {
        return Sort::default();
    };

    let (descending, key_str) = raw
        .strip_prefix('-')
        .map_or((false, raw.as_str()), |rest| (true, rest));

    let key = match key_str {
        "rating" => Some(SortKey::Rating),
        "reviewCount" => Some(SortKey::ReviewCount),
        "priceLevel" => Some(SortKey::PriceLevel),
        "estimatedDeliveryTime" => Some(SortKey::DeliveryTime),
        "name" => Some(SortKey::Name),
        // Unknown keys drop the sort filter, like any other malformed value.
        _ => None,
    };

    key.map_or_else(Sort::default, |key| Sort { key, descending })
}

/// Merges the `cuisine` and `cuisines` parameters and splits on commas.
fn split_cuisines(cuisine: Option<&str>, cuisines: Option<&str>) -> Vec<String> {
    [cuisine, cuisines]
        .into_iter()
        .flatten()
        .flat_map(|raw| raw.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Lenient float parse: `None` for missing, unparseable, or non-finite input.
fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Lenient integer parse: `None` for missing or unparseable input.
fn parse_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Boolean flags are only honored for the literal `"true"`.
fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| s.trim() == "true")
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;

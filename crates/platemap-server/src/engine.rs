//! Query execution.
//!
//! Takes a compiled [`FilterSpec`] and runs it against storage, picking the
//! attribute or proximity path based on whether the spec carries an origin.
//! Both paths produce a page of rows plus a total count computed from the
//! identical predicate set, so the reported total always matches what paging
//! through the results would yield.
//!
//! Execution is infallible from the caller's perspective: a storage failure
//! is logged and degrades to an empty result with total 0 rather than
//! surfacing as a request error.

use chrono::{DateTime, Utc};
use platemap_core::filter::{FilterSpec, Pagination};
use platemap_core::is_open_at;
use platemap_db::{RestaurantRow, SearchFilters};
use sqlx::PgPool;

/// Upper bound on rows fetched for the open-now superset scan. A request
/// whose matching set exceeds this sees a truncated (but still consistent)
/// total.
const OPEN_NOW_SCAN_CAP: i64 = 5000;

/// One executed search: a page of rows and the total match count.
#[derive(Debug)]
pub struct SearchOutcome {
    pub restaurants: Vec<RestaurantRow>,
    pub total: i64,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            restaurants: Vec::new(),
            total: 0,
        }
    }
}

/// Executes `spec` against the pool, evaluating any open-now post-filter at
/// `now`.
///
/// Storage errors never propagate: they are logged and the outcome degrades
/// to an empty page with total 0.
pub async fn execute(pool: &PgPool, spec: &FilterSpec, now: DateTime<Utc>) -> SearchOutcome {
    match run(pool, spec, now).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, ?spec, "search execution failed; returning empty result");
            SearchOutcome::empty()
        }
    }
}

async fn run(
    pool: &PgPool,
    spec: &FilterSpec,
    now: DateTime<Utc>,
) -> Result<SearchOutcome, sqlx::Error> {
    let filters = SearchFilters::from_spec(spec);
    let page = spec.pagination;

    if let Some(origin) = &spec.origin {
        if spec.open_now {
            // The open-now predicate cannot run in storage, so fetch the
            // full candidate set (up to the scan cap), evaluate hours
            // in-process, and paginate afterwards. Totals reflect the
            // post-filter count.
            let candidates = platemap_db::search_restaurants_nearby(
                pool,
                origin,
                &filters,
                OPEN_NOW_SCAN_CAP,
                0,
            )
            .await?;
            Ok(paginate_open_now(candidates, page, now))
        } else {
            let restaurants = platemap_db::search_restaurants_nearby(
                pool,
                origin,
                &filters,
                page.limit,
                page.offset(),
            )
            .await?;
            let total = platemap_db::count_restaurants_nearby(pool, origin, &filters).await?;
            Ok(SearchOutcome { restaurants, total })
        }
    } else if spec.open_now {
        let candidates =
            platemap_db::search_restaurants(pool, &filters, spec.sort, OPEN_NOW_SCAN_CAP, 0)
                .await?;
        Ok(paginate_open_now(candidates, page, now))
    } else {
        let restaurants =
            platemap_db::search_restaurants(pool, &filters, spec.sort, page.limit, page.offset())
                .await?;
        let total = platemap_db::count_restaurants(pool, &filters).await?;
        Ok(SearchOutcome { restaurants, total })
    }
}

/// Applies the open-now post-filter to an already-sorted candidate set, then
/// slices out the requested page. The total is the count after filtering.
fn paginate_open_now(
    candidates: Vec<RestaurantRow>,
    page: Pagination,
    now: DateTime<Utc>,
) -> SearchOutcome {
    let open: Vec<RestaurantRow> = candidates
        .into_iter()
        .filter(|row| is_open_at(&row.opening_hours, now))
        .collect();

    let total = i64::try_from(open.len()).unwrap_or(i64::MAX);
    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let restaurants: Vec<RestaurantRow> = open
        .into_iter()
        .skip(start)
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect();

    SearchOutcome { restaurants, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use platemap_core::OpeningHours;

    fn row(id: i64, wed: Option<&str>) -> RestaurantRow {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap();
        RestaurantRow {
            id,
            external_id: format!("ext-{id}"),
            name: format!("Restaurant {id}"),
            address: String::new(),
            area: "Florentin".to_string(),
            latitude: None,
            longitude: None,
            cuisines: vec![],
            price_level: None,
            rating: 4.0,
            review_count: 10,
            photo_url: None,
            is_open: false,
            opening_hours: sqlx::types::Json(OpeningHours {
                wed: wed.map(ToOwned::to_owned),
                ..OpeningHours::default()
            }),
            delivery_minutes: 30,
            distance_km: None,
            last_updated: now,
            created_at: now,
            distance_m: None,
        }
    }

    // 2026-08-26 is a Wednesday.
    fn wednesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn open_now_filter_drops_closed_rows_and_counts_after_filtering() {
        let candidates = vec![
            row(1, Some("09:00-17:00")),
            row(2, Some("Closed")),
            row(3, Some("11:00-14:00")),
            row(4, None),
        ];
        let outcome = paginate_open_now(
            candidates,
            Pagination { page: 1, limit: 10 },
            wednesday_noon(),
        );
        assert_eq!(outcome.total, 2);
        let ids: Vec<i64> = outcome.restaurants.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn open_now_pagination_slices_after_filtering() {
        let candidates = vec![
            row(1, Some("09:00-17:00")),
            row(2, Some("Closed")),
            row(3, Some("09:00-17:00")),
            row(4, Some("09:00-17:00")),
        ];
        let outcome = paginate_open_now(
            candidates,
            Pagination { page: 2, limit: 2 },
            wednesday_noon(),
        );
        // Open rows are [1, 3, 4]; page 2 of size 2 is [4].
        assert_eq!(outcome.total, 3);
        let ids: Vec<i64> = outcome.restaurants.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn open_now_page_past_the_end_is_empty_with_real_total() {
        let candidates = vec![row(1, Some("09:00-17:00"))];
        let outcome = paginate_open_now(
            candidates,
            Pagination { page: 5, limit: 20 },
            wednesday_noon(),
        );
        assert_eq!(outcome.total, 1);
        assert!(outcome.restaurants.is_empty());
    }
}

//! Queries for the `restaurants` table.

mod read;
mod types;
mod write;

pub use read::{
    count_restaurants, count_restaurants_nearby, get_restaurant_by_external_id,
    search_restaurants, search_restaurants_nearby,
};
pub use types::{RestaurantRow, SearchFilters};
pub use write::upsert_restaurants;

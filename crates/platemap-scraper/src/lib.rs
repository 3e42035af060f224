pub mod client;
pub mod error;
pub mod normalize;
pub mod rate_limit;
pub mod types;

pub use client::ListingsClient;
pub use error::ScraperError;
pub use normalize::normalize_restaurant;
pub use types::{PlatformListingsResponse, PlatformOpeningHours, PlatformRestaurant};

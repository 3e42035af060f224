mod app_config;
mod areas;
mod config;
pub mod filter;
pub mod hours;
mod restaurant;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use areas::{load_areas, AreaConfig, AreasFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{
    compile, compile_nearby, Field, FilterSpec, Origin, Pagination, Predicate, RawNearbyParams,
    RawSearchParams, Scalar, Sort, SortKey,
};
pub use hours::{is_open_at, OpeningHours};
pub use restaurant::NormalizedRestaurant;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read areas file {path}: {source}")]
    AreasFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse areas file: {0}")]
    AreasFileParse(#[from] serde_yaml::Error),

    #[error("areas file validation failed: {0}")]
    AreasValidation(String),
}

pub mod app_config;
pub mod catalog;
pub mod catalog_seed;
pub mod category_tree;
pub mod config;
pub mod identity;
pub mod stock;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{AppliedDiscount, Category, Code, Color, Discount, Product, Size, Stock, User};
pub use catalog_seed::{load_catalog_seed, CatalogSeed, CategorySeed, OptionSeed};
pub use category_tree::{CategoryTree, PATH_SEPARATOR};
pub use config::{load_app_config, load_app_config_from_env};
pub use identity::{CallerIdentity, Role};
pub use stock::{group_by_code, CodeFamily, PriceRange, StockAggregator};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("category hierarchy contains a cycle at category {category_id}")]
    CyclicHierarchy { category_id: i64 },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("category {parent_id} cannot be the parent of category {category_id}")]
    InvalidParent { category_id: i64, parent_id: i64 },
    #[error("invalid role: {0}")]
    InvalidRole(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

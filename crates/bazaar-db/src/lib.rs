use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

// Path relative to crates/bazaar-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &bazaar_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("discount {0} is inactive and cannot be attached")]
    InactiveDiscount(i64),
    #[error("no {0} rows exist yet; run `bazaar-cli db seed` first")]
    MissingReferenceData(&'static str),
    #[error(transparent)]
    Core(#[from] bazaar_core::CoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database;
    // treat absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_comes_from_app_config() {
        let app = bazaar_core::AppConfig {
            database_url: "postgres://localhost/bazaar".to_string(),
            env: bazaar_core::Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
            log_level: "info".to_string(),
            media_root: std::path::PathBuf::from("./media"),
            catalog_path: std::path::PathBuf::from("./config/catalog.yaml"),
            db_max_connections: 7,
            db_min_connections: 2,
            db_acquire_timeout_secs: 15,
            family_page_size: 10,
            storefront_page_size: 12,
        };

        let config = PoolConfig::from_app_config(&app);
        assert_eq!(config.max_connections, 7);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout_secs, 15);
    }
}

pub mod categories;
pub mod codes;
pub mod discounts;
pub mod options;
pub mod products;
pub mod seed;
pub mod users;

pub use categories::{
    create_category, delete_category, get_category, list_categories, set_category_active,
    update_category, CategoryDraft, CategoryRow,
};
pub use codes::{delete_orphaned_codes, list_codes, list_codes_by_ids, CodeRow};
pub use discounts::{
    create_discount, delete_discount, get_discount, list_discounts, set_discount_active,
    update_discount, DiscountDraft, DiscountRow,
};
pub use options::{
    create_option, delete_option, list_options, set_option_active, update_option, OptionDraft,
    OptionKind, OptionRow,
};
pub use products::{
    add_variant, count_active_products, create_product, delete_family, delete_product,
    family_code_id, get_product, get_stock_for_product, list_active_products,
    list_products_by_ids, list_stocks, list_stocks_for_codes, set_family_active,
    set_product_active, set_product_discount, update_product, CodeChoice, CreatedProduct,
    FamilyDeletion, ProductDraft, ProductRow, StockDraft, StockRow,
};
pub use seed::{insert_fake_products, seed_catalog, SeedSummary};
pub use users::{
    create_user, delete_user, get_user, get_user_by_email, list_sellers_with_counts,
    list_users_by_role, set_user_active, SellerSummaryRow, UserRow,
};

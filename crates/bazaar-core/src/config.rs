use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Largest page size accepted for any listing.
const MAX_PAGE_SIZE: usize = 1000;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_page_size = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => Ok(n),
            Ok(_) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("page size must be between 1 and {MAX_PAGE_SIZE}"),
            }),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("BAZAAR_ENV", "development"))?;

    let bind_addr = parse_addr("BAZAAR_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BAZAAR_LOG_LEVEL", "info");
    let media_root = PathBuf::from(or_default("BAZAAR_MEDIA_ROOT", "./media"));
    let catalog_path = PathBuf::from(or_default("BAZAAR_CATALOG_PATH", "./config/catalog.yaml"));

    let db_max_connections = parse_u32("BAZAAR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("BAZAAR_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("BAZAAR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let family_page_size = parse_page_size("BAZAAR_FAMILY_PAGE_SIZE", "5")?;
    let storefront_page_size = parse_page_size("BAZAAR_STOREFRONT_PAGE_SIZE", "12")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        media_root,
        catalog_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        family_page_size,
        storefront_page_size,
    })
}

/// Parse `BAZAAR_ENV` into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BAZAAR_ENV".to_string(),
            reason: format!("unknown environment '{other}'; expected development, test or production"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

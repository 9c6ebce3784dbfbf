//! `db` command handlers.
//!
//! Called from `main` once the pool is connected.

use bazaar_core::{AppConfig, Role};

pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    bazaar_db::ping(pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = bazaar_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load the catalog file named by `BAZAAR_CATALOG_PATH` and upsert it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or on database
/// failure. Nothing is written when the file is invalid.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let seed = bazaar_core::load_catalog_seed(&config.catalog_path)?;
    tracing::info!(path = %config.catalog_path.display(), "loaded catalog seed");
    let summary = bazaar_db::seed_catalog(pool, &seed).await?;

    println!(
        "seeded {} size(s), {} color(s), {} categor{} from {}",
        summary.sizes,
        summary.colors,
        summary.categories,
        if summary.categories == 1 { "y" } else { "ies" },
        config.catalog_path.display()
    );
    Ok(())
}

/// Create `count` fake products owned by the seller with `seller_email`.
///
/// # Errors
///
/// Returns an error if no seller has that email, if sizes or colors have not
/// been seeded, or on database failure.
pub(crate) async fn run_fake(
    pool: &sqlx::PgPool,
    count: usize,
    seller_email: &str,
) -> anyhow::Result<()> {
    let user = bazaar_db::get_user_by_email(pool, seller_email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no user with email '{seller_email}'"))?;
    let role: Role = user.role.parse()?;
    if role != Role::Seller {
        anyhow::bail!("user '{seller_email}' is a {role}, not a seller");
    }

    tracing::info!(seller_id = user.id, count, "generating fake products");
    let created = bazaar_db::insert_fake_products(pool, user.id, count).await?;
    println!("created {created} fake product(s) for {seller_email}");
    Ok(())
}

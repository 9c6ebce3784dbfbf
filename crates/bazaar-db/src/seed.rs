//! Reference data seeding and fake catalog generation for local development.

use bazaar_core::{CatalogSeed, CategorySeed, OptionSeed, Product};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{options::OptionKind, DbError};

/// Rows touched by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub sizes: usize,
    pub colors: usize,
    pub categories: usize,
}

/// Upsert sizes, colors and the category tree from a catalog seed.
///
/// Existing rows are matched by name (categories by name under the same
/// parent) and updated, so seeding twice leaves one copy of everything.
/// Runs in a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;

    for option in &seed.sizes {
        upsert_option(&mut tx, OptionKind::Size, option).await?;
    }
    for option in &seed.colors {
        upsert_option(&mut tx, OptionKind::Color, option).await?;
    }

    // Parents are always written before their children.
    let mut pending: Vec<(Option<i64>, &CategorySeed)> =
        seed.categories.iter().rev().map(|c| (None, c)).collect();
    while let Some((parent_id, category)) = pending.pop() {
        let id = upsert_category(&mut tx, parent_id, category).await?;
        pending.extend(category.children.iter().rev().map(|c| (Some(id), c)));
    }

    tx.commit().await?;

    let summary = SeedSummary {
        sizes: seed.sizes.len(),
        colors: seed.colors.len(),
        categories: seed.category_count(),
    };
    tracing::info!(
        sizes = summary.sizes,
        colors = summary.colors,
        categories = summary.categories,
        "catalog seeded"
    );
    Ok(summary)
}

async fn upsert_option(
    conn: &mut PgConnection,
    kind: OptionKind,
    option: &OptionSeed,
) -> Result<i64, DbError> {
    let table = kind.table();

    let updated = sqlx::query_scalar::<_, i64>(&format!(
        "UPDATE {table} SET description = $2, active = $3, updated_at = NOW() \
         WHERE lower(name) = lower($1) RETURNING id"
    ))
    .bind(&option.name)
    .bind(&option.description)
    .bind(option.active)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = updated {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, i64>(&format!(
        "INSERT INTO {table} (name, description, active) VALUES ($1, $2, $3) RETURNING id"
    ))
    .bind(&option.name)
    .bind(&option.description)
    .bind(option.active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn upsert_category(
    conn: &mut PgConnection,
    parent_id: Option<i64>,
    category: &CategorySeed,
) -> Result<i64, DbError> {
    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE categories SET description = $3, active = $4, updated_at = NOW() \
         WHERE lower(name) = lower($1) AND parent_id IS NOT DISTINCT FROM $2 \
         RETURNING id",
    )
    .bind(&category.name)
    .bind(parent_id)
    .bind(&category.description)
    .bind(category.active)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = updated {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, parent_id, description, active) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&category.name)
    .bind(parent_id)
    .bind(&category.description)
    .bind(category.active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

// ---------------------------------------------------------------------------
// Fake products
// ---------------------------------------------------------------------------

const MAX_VARIANTS_PER_CODE: usize = 3;

/// One generated product, decided before anything touches the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeProduct {
    /// Index of the code family within this batch.
    pub family: usize,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub active: bool,
    pub size_id: i64,
    pub color_id: i64,
    pub category_id: Option<i64>,
}

/// Draws `count` fake products over the given reference ids.
///
/// Consecutive products share a family in runs of one to
/// [`MAX_VARIANTS_PER_CODE`]. Prices fall in `10.00..=100.00`.
pub(crate) fn plan_fake_products<R: Rng>(
    rng: &mut R,
    count: usize,
    size_ids: &[i64],
    color_ids: &[i64],
    category_ids: &[i64],
) -> Vec<FakeProduct> {
    let mut planned = Vec::with_capacity(count);
    let mut family = 0usize;

    while planned.len() < count {
        let variants = rng
            .random_range(1..=MAX_VARIANTS_PER_CODE)
            .min(count - planned.len());
        let category_id = if category_ids.is_empty() {
            None
        } else {
            Some(category_ids[rng.random_range(0..category_ids.len())])
        };

        for variant in 0..variants {
            planned.push(FakeProduct {
                family,
                name: format!("Sample product {} variant {}", family + 1, variant + 1),
                price: Decimal::new(rng.random_range(1_000..=10_000), 2),
                quantity: rng.random_range(0..1_000),
                active: rng.random_bool(0.5),
                size_id: size_ids[rng.random_range(0..size_ids.len())],
                color_id: color_ids[rng.random_range(0..color_ids.len())],
                category_id,
            });
        }
        family += 1;
    }

    planned
}

/// Insert `count` fake products owned by `seller_id`, each with one stock
/// row, grouped under freshly created `GEN-<id>` codes.
///
/// Returns the number of products inserted.
///
/// # Errors
///
/// Returns [`DbError::MissingReferenceData`] when no sizes or colors exist,
/// or [`DbError::Sqlx`] if any database operation fails.
pub async fn insert_fake_products(
    pool: &PgPool,
    seller_id: i64,
    count: usize,
) -> Result<usize, DbError> {
    let size_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM sizes ORDER BY id")
        .fetch_all(pool)
        .await?;
    if size_ids.is_empty() {
        return Err(DbError::MissingReferenceData("size"));
    }
    let color_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM colors ORDER BY id")
        .fetch_all(pool)
        .await?;
    if color_ids.is_empty() {
        return Err(DbError::MissingReferenceData("color"));
    }
    let category_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    let planned = plan_fake_products(
        &mut rand::rng(),
        count,
        &size_ids,
        &color_ids,
        &category_ids,
    );

    let mut tx = pool.begin().await?;
    let mut current: Option<(usize, i64)> = None;

    for fake in &planned {
        let code_id = match current {
            Some((family, code_id)) if family == fake.family => code_id,
            _ => {
                let code_id = sqlx::query_scalar::<_, i64>(
                    "WITH next AS (SELECT nextval(pg_get_serial_sequence('codes', 'id')) AS id) \
                     INSERT INTO codes (id, name) SELECT id, 'GEN-' || id FROM next \
                     RETURNING id",
                )
                .fetch_one(&mut *tx)
                .await?;
                current = Some((fake.family, code_id));
                code_id
            }
        };

        let product_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO products (name, short_desc, seller_id, category_id, price, active) \
             VALUES ($1, 'Generated for local development', $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(&fake.name)
        .bind(seller_id)
        .bind(fake.category_id)
        .bind(fake.price)
        .bind(fake.active)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET sku = $1 WHERE id = $2")
            .bind(Product::sku_for(product_id, seller_id))
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO stocks (product_id, size_id, color_id, code_id, quantity) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product_id)
        .bind(fake.size_id)
        .bind(fake.color_id)
        .bind(code_id)
        .bind(fake.quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(seller_id, inserted = planned.len(), "fake products inserted");
    Ok(planned.len())
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn plan_produces_exactly_count_products() {
        let mut rng = StdRng::seed_from_u64(7);
        let planned = plan_fake_products(&mut rng, 25, &[1, 2], &[3], &[]);
        assert_eq!(planned.len(), 25);
    }

    #[test]
    fn plan_of_zero_is_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(plan_fake_products(&mut rng, 0, &[1], &[1], &[1]).is_empty());
    }

    #[test]
    fn plan_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let planned = plan_fake_products(&mut rng, 200, &[1, 2, 3], &[10, 11], &[5]);

        for fake in &planned {
            assert!(fake.price >= Decimal::new(1_000, 2), "{}", fake.price);
            assert!(fake.price <= Decimal::new(10_000, 2), "{}", fake.price);
            assert!((0..1_000).contains(&fake.quantity));
            assert!([1, 2, 3].contains(&fake.size_id));
            assert!([10, 11].contains(&fake.color_id));
            assert_eq!(fake.category_id, Some(5));
        }
    }

    #[test]
    fn plan_groups_consecutive_products_into_small_families() {
        let mut rng = StdRng::seed_from_u64(3);
        let planned = plan_fake_products(&mut rng, 100, &[1], &[1], &[1, 2]);

        let mut run = 0usize;
        let mut previous = None;
        for fake in &planned {
            if previous == Some(fake.family) {
                run += 1;
            } else {
                if let Some(prev) = previous {
                    assert_eq!(fake.family, prev + 1, "families are numbered in order");
                }
                run = 1;
            }
            assert!(run <= MAX_VARIANTS_PER_CODE);
            previous = Some(fake.family);
        }
    }

    #[test]
    fn family_shares_one_category() {
        let mut rng = StdRng::seed_from_u64(11);
        let planned = plan_fake_products(&mut rng, 60, &[1], &[1], &[1, 2, 3, 4]);

        for pair in planned.windows(2) {
            if pair[0].family == pair[1].family {
                assert_eq!(pair[0].category_id, pair[1].category_id);
            }
        }
    }
}

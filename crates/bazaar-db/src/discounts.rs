//! Database operations for the `discounts` table.

use bazaar_core::Discount;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `discounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub percent: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Discount {
            id: row.id,
            name: row.name,
            description: row.description,
            percent: row.percent,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscountDraft {
    pub name: String,
    pub description: Option<String>,
    /// Whole percent, `0..=100` (enforced by a CHECK constraint).
    pub percent: i32,
    pub active: bool,
}

const DISCOUNT_COLUMNS: &str = "id, name, description, percent, active, created_at, updated_at";

/// Returns discounts ordered by id, optionally only the active ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_discounts(pool: &PgPool, active_only: bool) -> Result<Vec<DiscountRow>, DbError> {
    let rows = sqlx::query_as::<_, DiscountRow>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts \
         WHERE ($1 = false OR active = true) \
         ORDER BY id"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_discount(pool: &PgPool, id: i64) -> Result<Option<DiscountRow>, DbError> {
    let row = sqlx::query_as::<_, DiscountRow>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure (including a percent
/// outside `0..=100`).
pub async fn create_discount(pool: &PgPool, draft: &DiscountDraft) -> Result<DiscountRow, DbError> {
    let row = sqlx::query_as::<_, DiscountRow>(&format!(
        "INSERT INTO discounts (name, description, percent, active) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {DISCOUNT_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.percent)
    .bind(draft.active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrites a discount. Saving it inactive detaches it from every product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the discount does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn update_discount(
    pool: &PgPool,
    id: i64,
    draft: &DiscountDraft,
) -> Result<DiscountRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, DiscountRow>(&format!(
        "UPDATE discounts \
         SET name = $1, description = $2, percent = $3, active = $4, updated_at = NOW() \
         WHERE id = $5 \
         RETURNING {DISCOUNT_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.percent)
    .bind(draft.active)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    if !row.active {
        detach_discount(&mut tx, id).await?;
    }
    tx.commit().await?;

    Ok(row)
}

/// Toggles a discount. Deactivating detaches it from every product.
///
/// Returns the number of products the discount was removed from.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the discount does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_discount_active(pool: &PgPool, id: i64, active: bool) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    let result =
        sqlx::query("UPDATE discounts SET active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let detached = if active {
        0
    } else {
        detach_discount(&mut tx, id).await?
    };
    tx.commit().await?;

    Ok(detached)
}

/// Deletes a discount; products keep existing with `discount_id` cleared.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the discount does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn delete_discount(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

async fn detach_discount(conn: &mut PgConnection, id: i64) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products SET discount_id = NULL, updated_at = NOW() WHERE discount_id = $1",
    )
    .bind(id)
    .execute(conn)
    .await?;

    let detached = result.rows_affected();
    if detached > 0 {
        tracing::info!(discount_id = id, detached, "inactive discount detached from products");
    }
    Ok(detached)
}

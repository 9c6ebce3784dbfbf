//! Database operations for the self-referential `categories` table.
//!
//! Hierarchy rules (no cycles, parent must exist) are checked by the caller
//! against a [`bazaar_core::CategoryTree`] built from [`list_categories`];
//! this module only persists.

use bazaar_core::Category;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields a superuser sets when creating or editing a category.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub active: bool,
}

const CATEGORY_COLUMNS: &str = "id, name, parent_id, description, active, created_at, updated_at";

/// Returns every category ordered by id.
///
/// The whole table is fetched at once; callers build a
/// [`bazaar_core::CategoryTree`] from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a category by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a category and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (for example an unknown
/// `parent_id`).
pub async fn create_category(pool: &PgPool, draft: &CategoryDraft) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "INSERT INTO categories (name, parent_id, description, active) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(draft.parent_id)
    .bind(&draft.description)
    .bind(draft.active)
    .fetch_one(pool)
    .await?;

    tracing::info!(category_id = row.id, parent_id = ?row.parent_id, "category created");
    Ok(row)
}

/// Overwrites a category's fields.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the category does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    draft: &CategoryDraft,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "UPDATE categories \
         SET name = $1, parent_id = $2, description = $3, active = $4, updated_at = NOW() \
         WHERE id = $5 \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(draft.parent_id)
    .bind(&draft.description)
    .bind(draft.active)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Sets the `active` flag of a single category.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the category does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_category_active(pool: &PgPool, id: i64, active: bool) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE categories SET active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Deletes a category. Descendants go with it through `ON DELETE CASCADE`
/// and their products have `category_id` cleared.
///
/// Returns the number of categories removed, counting the category itself.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the category does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    let removed = before - after;
    tracing::info!(category_id = id, removed, "category deleted");
    Ok(removed)
}

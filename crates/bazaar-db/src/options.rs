//! Database operations for the `sizes` and `colors` tables.
//!
//! Both tables share one shape, so one set of queries serves them and
//! [`OptionKind`] picks the table.

use bazaar_core::{Color, Size};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{codes::delete_orphaned_codes, DbError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Size,
    Color,
}

impl OptionKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            OptionKind::Size => "sizes",
            OptionKind::Color => "colors",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Size => "size",
            OptionKind::Color => "color",
        }
    }
}

/// A row from `sizes` or `colors`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptionRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OptionRow> for Size {
    fn from(row: OptionRow) -> Self {
        Size {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<OptionRow> for Color {
    fn from(row: OptionRow) -> Self {
        Color {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionDraft {
    pub name: String,
    pub description: String,
    pub active: bool,
}

const OPTION_COLUMNS: &str = "id, name, description, active, created_at, updated_at";

/// Returns every size or color ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_options(pool: &PgPool, kind: OptionKind) -> Result<Vec<OptionRow>, DbError> {
    let rows = sqlx::query_as::<_, OptionRow>(&format!(
        "SELECT {OPTION_COLUMNS} FROM {} ORDER BY id",
        kind.table()
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn create_option(
    pool: &PgPool,
    kind: OptionKind,
    draft: &OptionDraft,
) -> Result<OptionRow, DbError> {
    let row = sqlx::query_as::<_, OptionRow>(&format!(
        "INSERT INTO {} (name, description, active) VALUES ($1, $2, $3) \
         RETURNING {OPTION_COLUMNS}",
        kind.table()
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn update_option(
    pool: &PgPool,
    kind: OptionKind,
    id: i64,
    draft: &OptionDraft,
) -> Result<OptionRow, DbError> {
    let row = sqlx::query_as::<_, OptionRow>(&format!(
        "UPDATE {} SET name = $1, description = $2, active = $3, updated_at = NOW() \
         WHERE id = $4 RETURNING {OPTION_COLUMNS}",
        kind.table()
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.active)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_option_active(
    pool: &PgPool,
    kind: OptionKind,
    id: i64,
    active: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET active = $1, updated_at = NOW() WHERE id = $2",
        kind.table()
    ))
    .bind(active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Deletes a size or color. Its stock rows cascade, and codes left without
/// stock rows are removed with them.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn delete_option(pool: &PgPool, kind: OptionKind, id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let removed_codes = delete_orphaned_codes(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(kind = kind.as_str(), id, removed_codes, "option deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_kind_selects_table() {
        assert_eq!(OptionKind::Size.table(), "sizes");
        assert_eq!(OptionKind::Color.table(), "colors");
    }

    #[test]
    fn option_kind_labels_are_singular() {
        assert_eq!(OptionKind::Size.as_str(), "size");
        assert_eq!(OptionKind::Color.as_str(), "color");
    }
}

//! Database operations for the `codes` table.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::DbError;

/// A row from the `codes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CodeRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CodeRow> for bazaar_core::Code {
    fn from(row: CodeRow) -> Self {
        bazaar_core::Code {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Returns every code ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_codes(pool: &PgPool) -> Result<Vec<CodeRow>, DbError> {
    let rows = sqlx::query_as::<_, CodeRow>(
        "SELECT id, name, created_at, updated_at FROM codes ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the codes whose ids are in `ids`. Unknown ids are ignored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_codes_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<CodeRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, CodeRow>(
        "SELECT id, name, created_at, updated_at FROM codes WHERE id = ANY($1) ORDER BY id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Removes every code that no stock row references any more.
///
/// Takes any executor so it can run inside the transaction that removed the
/// stock rows. Returns the number of codes deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn delete_orphaned_codes<'e, E>(executor: E) -> Result<u64, DbError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM codes c \
         WHERE NOT EXISTS (SELECT 1 FROM stocks s WHERE s.code_id = c.id)",
    )
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

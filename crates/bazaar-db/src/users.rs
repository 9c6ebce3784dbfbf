//! Database operations for the `users` table.

use bazaar_core::{CoreError, Role, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{codes::delete_orphaned_codes, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// One of `seller`, `superuser`, `customer` (enforced by a CHECK constraint).
    pub role: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse()?,
            active: row.is_active,
            joined_at: row.joined_at,
        })
    }
}

/// A seller with the size of their catalog, for the superuser seller list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SellerSummaryRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub product_count: i64,
    /// Distinct code families across the seller's products.
    pub code_count: i64,
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, is_active, joined_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a user with the given role.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate email).
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, first_name, last_name, role) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a user by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a user by email, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every user holding `role`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_users_by_role(pool: &PgPool, role: Role) -> Result<Vec<UserRow>, DbError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY joined_at DESC, id DESC"
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every seller with product and code family counts, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_sellers_with_counts(pool: &PgPool) -> Result<Vec<SellerSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, SellerSummaryRow>(
        "SELECT u.id, u.email, u.first_name, u.last_name, u.is_active, u.joined_at, \
                COUNT(DISTINCT p.id) AS product_count, \
                COUNT(DISTINCT s.code_id) AS code_count \
         FROM users u \
         LEFT JOIN products p ON p.seller_id = u.id \
         LEFT JOIN stocks s ON s.product_id = p.id \
         WHERE u.role = 'seller' \
         GROUP BY u.id \
         ORDER BY u.joined_at DESC, u.id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets `is_active` on a user, scoped to `role` so a seller id cannot be
/// toggled through the customer endpoints and vice versa.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no user with that id and role exists,
/// or [`DbError::Sqlx`] on database failure.
pub async fn set_user_active(
    pool: &PgPool,
    id: i64,
    role: Role,
    active: bool,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2 AND role = $3")
        .bind(active)
        .bind(id)
        .bind(role.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Deletes a user of `role` together with everything they own.
///
/// Products cascade from the user and stocks from the products; codes left
/// without stock rows are removed in the same transaction. Returns the
/// thumbnail paths of the deleted products so the caller can remove the
/// files.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no user with that id and role exists,
/// or [`DbError::Sqlx`] on database failure.
pub async fn delete_user(pool: &PgPool, id: i64, role: Role) -> Result<Vec<String>, DbError> {
    let mut tx = pool.begin().await?;

    let thumbs = sqlx::query_scalar::<_, String>(
        "SELECT thumb FROM products WHERE seller_id = $1 AND thumb IS NOT NULL",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = $2")
        .bind(id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let removed_codes = delete_orphaned_codes(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(user_id = id, role = %role, removed_codes, "user deleted");
    Ok(thumbs)
}

//! Database operations for `products` and their `stocks` rows.
//!
//! Every product a seller creates gets exactly one stock row, and stock rows
//! sharing a `code_id` form one code family. Operations that can leave a
//! code without stock rows remove the orphaned code in the same transaction.

use bazaar_core::{AppliedDiscount, Product, Stock};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{codes::delete_orphaned_codes, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `products`, joined with the discount it carries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub sku: Option<String>,
    pub name: String,
    pub cart_desc: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub thumb: Option<String>,
    pub seller_id: Option<i64>,
    pub category_id: Option<i64>,
    pub discount_id: Option<i64>,
    /// `discounts.percent`, present when `discount_id` is set.
    pub discount_percent: Option<i32>,
    /// `discounts.active`, present when `discount_id` is set.
    pub discount_active: Option<bool>,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let discount = match (row.discount_id, row.discount_percent, row.discount_active) {
            (Some(id), Some(percent), Some(active)) => Some(AppliedDiscount {
                id,
                percent,
                active,
            }),
            _ => None,
        };

        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            cart_desc: row.cart_desc,
            short_desc: row.short_desc,
            long_desc: row.long_desc,
            thumb: row.thumb,
            seller_id: row.seller_id,
            category_id: row.category_id,
            discount,
            price: row.price,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `stocks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockRow {
    pub id: i64,
    pub product_id: i64,
    pub size_id: i64,
    pub color_id: i64,
    pub code_id: i64,
    pub quantity: i32,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Stock {
            id: row.id,
            product_id: row.product_id,
            size_id: row.size_id,
            color_id: row.color_id,
            code_id: row.code_id,
            quantity: row.quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Write inputs
// ---------------------------------------------------------------------------

/// Product fields a seller fills in on the product form.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub cart_desc: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    /// `None` keeps the current thumbnail on update.
    pub thumb: Option<String>,
    pub category_id: Option<i64>,
    pub price: Decimal,
    pub active: bool,
}

/// The stock row fields of the product form.
#[derive(Debug, Clone, Copy)]
pub struct StockDraft {
    pub size_id: i64,
    pub color_id: i64,
    pub quantity: i32,
}

/// Which code family a product joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeChoice {
    Existing(i64),
    /// Create a code with this name first.
    New(String),
}

#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub product: ProductRow,
    pub stock: StockRow,
}

/// What a family deletion removed.
#[derive(Debug, Clone, Default)]
pub struct FamilyDeletion {
    pub product_count: u64,
    /// Thumbnail paths of the deleted products, for file cleanup.
    pub thumbs: Vec<String>,
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.sku, p.name, p.cart_desc, p.short_desc, \
            p.long_desc, p.thumb, p.seller_id, p.category_id, p.discount_id, \
            d.percent AS discount_percent, d.active AS discount_active, \
            p.price, p.active, p.created_at, p.updated_at \
     FROM products p \
     LEFT JOIN discounts d ON d.id = p.discount_id";

const STOCK_COLUMNS: &str = "id, product_id, size_id, color_id, code_id, quantity";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns a product with its discount, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the products whose ids are in `ids`, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_products_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ProductRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.id = ANY($1) ORDER BY p.id"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one page of active products, newest first.
///
/// With `category_ids`, only products in one of those categories are
/// returned; callers pass a category plus its descendants.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_active_products(
    pool: &PgPool,
    category_ids: Option<&[i64]>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} \
         WHERE p.active = true \
           AND ($1::BIGINT[] IS NULL OR p.category_id = ANY($1)) \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(category_ids.map(<[i64]>::to_vec))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts the rows [`list_active_products`] pages over.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn count_active_products(
    pool: &PgPool,
    category_ids: Option<&[i64]>,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM products p \
         WHERE p.active = true \
           AND ($1::BIGINT[] IS NULL OR p.category_id = ANY($1))",
    )
    .bind(category_ids.map(<[i64]>::to_vec))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns stock rows in id order, optionally only those of one seller's
/// products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_stocks(pool: &PgPool, seller_id: Option<i64>) -> Result<Vec<StockRow>, DbError> {
    let rows = sqlx::query_as::<_, StockRow>(
        "SELECT s.id, s.product_id, s.size_id, s.color_id, s.code_id, s.quantity \
         FROM stocks s \
         JOIN products p ON p.id = s.product_id \
         WHERE ($1::BIGINT IS NULL OR p.seller_id = $1) \
         ORDER BY s.id",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every stock row carrying one of `code_ids`, in id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn list_stocks_for_codes(
    pool: &PgPool,
    code_ids: &[i64],
) -> Result<Vec<StockRow>, DbError> {
    if code_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, StockRow>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stocks WHERE code_id = ANY($1) ORDER BY id"
    ))
    .bind(code_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the stock row of a product, or `None` if it has none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn get_stock_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<StockRow>, DbError> {
    let row = sqlx::query_as::<_, StockRow>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stocks WHERE product_id = $1 ORDER BY id LIMIT 1"
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the code family a product belongs to.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn family_code_id(pool: &PgPool, product_id: i64) -> Result<Option<i64>, DbError> {
    let mut conn = pool.acquire().await?;
    code_of_product(&mut conn, product_id).await
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Creates a product with its stock row, in the chosen code family.
///
/// The SKU is derived from the new id and `seller_id` once the insert has
/// assigned the id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if an existing code id is unknown, or
/// [`DbError::Sqlx`] on database failure (including a duplicate new code
/// name).
pub async fn create_product(
    pool: &PgPool,
    seller_id: i64,
    draft: &ProductDraft,
    stock: StockDraft,
    code: &CodeChoice,
) -> Result<CreatedProduct, DbError> {
    let mut tx = pool.begin().await?;

    let code_id = resolve_code(&mut tx, code).await?;
    let created = insert_product_with_stock(&mut tx, Some(seller_id), draft, stock, code_id).await?;
    tx.commit().await?;

    tracing::info!(
        product_id = created.product.id,
        seller_id,
        code_id,
        "product created"
    );
    Ok(created)
}

/// Adds a size/color variant to the family of `base_product_id`.
///
/// The variant belongs to the base product's seller and inherits its
/// thumbnail when `draft.thumb` is `None`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the base product or its stock row is
/// missing, or [`DbError::Sqlx`] on database failure.
pub async fn add_variant(
    pool: &PgPool,
    base_product_id: i64,
    draft: &ProductDraft,
    stock: StockDraft,
) -> Result<CreatedProduct, DbError> {
    let mut tx = pool.begin().await?;

    let base = fetch_product(&mut tx, base_product_id)
        .await?
        .ok_or(DbError::NotFound)?;
    let code_id = code_of_product(&mut tx, base_product_id)
        .await?
        .ok_or(DbError::NotFound)?;

    let mut draft = draft.clone();
    if draft.thumb.is_none() {
        draft.thumb.clone_from(&base.thumb);
    }

    let created = insert_product_with_stock(&mut tx, base.seller_id, &draft, stock, code_id).await?;
    tx.commit().await?;

    tracing::info!(
        product_id = created.product.id,
        base_product_id,
        code_id,
        "variant added"
    );
    Ok(created)
}

/// Updates a product and its stock row, optionally moving it to another
/// code family.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product or a chosen code is missing,
/// or [`DbError::Sqlx`] on database failure.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    draft: &ProductDraft,
    stock: StockDraft,
    code: Option<&CodeChoice>,
) -> Result<ProductRow, DbError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE products \
         SET name = $1, cart_desc = $2, short_desc = $3, long_desc = $4, \
             thumb = COALESCE($5, thumb), category_id = $6, price = $7, active = $8, \
             updated_at = NOW() \
         WHERE id = $9",
    )
    .bind(&draft.name)
    .bind(&draft.cart_desc)
    .bind(&draft.short_desc)
    .bind(&draft.long_desc)
    .bind(&draft.thumb)
    .bind(draft.category_id)
    .bind(draft.price)
    .bind(draft.active)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let code_id = match code {
        Some(choice) => Some(resolve_code(&mut tx, choice).await?),
        None => None,
    };

    sqlx::query(
        "UPDATE stocks \
         SET size_id = $1, color_id = $2, quantity = $3, code_id = COALESCE($4, code_id) \
         WHERE product_id = $5",
    )
    .bind(stock.size_id)
    .bind(stock.color_id)
    .bind(stock.quantity)
    .bind(code_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if code_id.is_some() {
        delete_orphaned_codes(&mut *tx).await?;
    }

    let row = fetch_product(&mut tx, id).await?.ok_or(DbError::NotFound)?;
    tx.commit().await?;

    Ok(row)
}

/// Deletes one product; its stock row cascades and an orphaned code is
/// removed. Returns the thumbnail path the product had.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<Option<String>, DbError> {
    let mut tx = pool.begin().await?;

    let thumb = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM products WHERE id = $1 RETURNING thumb",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let removed_codes = delete_orphaned_codes(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(product_id = id, removed_codes, "product deleted");
    Ok(thumb)
}

/// Deletes every product in the code family of `product_id`.
///
/// With `seller_scope`, only that seller's products in the family go. The
/// code is removed once no stock rows reference it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product has no stock row, or
/// [`DbError::Sqlx`] on database failure.
pub async fn delete_family(
    pool: &PgPool,
    product_id: i64,
    seller_scope: Option<i64>,
) -> Result<FamilyDeletion, DbError> {
    let mut tx = pool.begin().await?;

    let code_id = code_of_product(&mut tx, product_id)
        .await?
        .ok_or(DbError::NotFound)?;

    let thumbs = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM products p \
         WHERE p.id IN (SELECT s.product_id FROM stocks s WHERE s.code_id = $1) \
           AND ($2::BIGINT IS NULL OR p.seller_id = $2) \
         RETURNING p.thumb",
    )
    .bind(code_id)
    .bind(seller_scope)
    .fetch_all(&mut *tx)
    .await?;

    delete_orphaned_codes(&mut *tx).await?;
    tx.commit().await?;

    let deletion = FamilyDeletion {
        product_count: thumbs.len() as u64,
        thumbs: thumbs.into_iter().flatten().collect(),
    };
    tracing::info!(
        code_id,
        product_count = deletion.product_count,
        "product family deleted"
    );
    Ok(deletion)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_product_active(pool: &PgPool, id: i64, active: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE products SET active = $1, updated_at = NOW() WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Sets `active` on every product in the code family of `product_id`,
/// optionally only on one seller's products. Returns the number updated.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product has no stock row, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_family_active(
    pool: &PgPool,
    product_id: i64,
    seller_scope: Option<i64>,
    active: bool,
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    let code_id = code_of_product(&mut tx, product_id)
        .await?
        .ok_or(DbError::NotFound)?;

    let result = sqlx::query(
        "UPDATE products p SET active = $1, updated_at = NOW() \
         WHERE p.id IN (SELECT s.product_id FROM stocks s WHERE s.code_id = $2) \
           AND ($3::BIGINT IS NULL OR p.seller_id = $3)",
    )
    .bind(active)
    .bind(code_id)
    .bind(seller_scope)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Attaches a discount to a product, or clears it with `None`.
///
/// Only active discounts may be attached.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product or discount does not exist,
/// [`DbError::InactiveDiscount`] if the discount is inactive, or
/// [`DbError::Sqlx`] on database failure.
pub async fn set_product_discount(
    pool: &PgPool,
    id: i64,
    discount_id: Option<i64>,
) -> Result<ProductRow, DbError> {
    let mut tx = pool.begin().await?;

    if let Some(discount_id) = discount_id {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT active FROM discounts WHERE id = $1 FOR SHARE",
        )
        .bind(discount_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        if !active {
            return Err(DbError::InactiveDiscount(discount_id));
        }
    }

    let result =
        sqlx::query("UPDATE products SET discount_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(discount_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let row = fetch_product(&mut tx, id).await?.ok_or(DbError::NotFound)?;
    tx.commit().await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Transaction helpers
// ---------------------------------------------------------------------------

async fn fetch_product(conn: &mut PgConnection, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row)
}

async fn code_of_product(conn: &mut PgConnection, product_id: i64) -> Result<Option<i64>, DbError> {
    let code_id = sqlx::query_scalar::<_, i64>(
        "SELECT code_id FROM stocks WHERE product_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;

    Ok(code_id)
}

async fn resolve_code(conn: &mut PgConnection, code: &CodeChoice) -> Result<i64, DbError> {
    match code {
        CodeChoice::Existing(id) => {
            sqlx::query_scalar::<_, i64>("SELECT id FROM codes WHERE id = $1")
                .bind(*id)
                .fetch_optional(conn)
                .await?
                .ok_or(DbError::NotFound)
        }
        CodeChoice::New(name) => {
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO codes (name) VALUES ($1) RETURNING id",
            )
            .bind(name)
            .fetch_one(conn)
            .await?;
            Ok(id)
        }
    }
}

async fn insert_product_with_stock(
    conn: &mut PgConnection,
    seller_id: Option<i64>,
    draft: &ProductDraft,
    stock: StockDraft,
    code_id: i64,
) -> Result<CreatedProduct, DbError> {
    let product_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, cart_desc, short_desc, long_desc, thumb, seller_id, category_id, price, active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&draft.name)
    .bind(&draft.cart_desc)
    .bind(&draft.short_desc)
    .bind(&draft.long_desc)
    .bind(&draft.thumb)
    .bind(seller_id)
    .bind(draft.category_id)
    .bind(draft.price)
    .bind(draft.active)
    .fetch_one(&mut *conn)
    .await?;

    if let Some(seller_id) = seller_id {
        sqlx::query("UPDATE products SET sku = $1 WHERE id = $2")
            .bind(Product::sku_for(product_id, seller_id))
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    }

    let stock = sqlx::query_as::<_, StockRow>(&format!(
        "INSERT INTO stocks (product_id, size_id, color_id, code_id, quantity) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {STOCK_COLUMNS}"
    ))
    .bind(product_id)
    .bind(stock.size_id)
    .bind(stock.color_id)
    .bind(code_id)
    .bind(stock.quantity)
    .fetch_one(&mut *conn)
    .await?;

    let product = fetch_product(conn, product_id)
        .await?
        .ok_or(DbError::NotFound)?;

    Ok(CreatedProduct { product, stock })
}

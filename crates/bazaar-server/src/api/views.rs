//! JSON shapes shared by the storefront, seller and admin routes.

use bazaar_core::{Category, CategoryTree, CoreError, Product, Role, User};
use bazaar_db::{DiscountRow, OptionRow, StockRow};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use super::{map_db_error, ApiError};

#[derive(Debug, Serialize)]
pub(super) struct ProductView {
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
    /// Only reported while the discount is active.
    pub discount_percent: Option<i32>,
    pub price: Decimal,
    pub effective_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            cart_desc: product.cart_desc.clone(),
            short_desc: product.short_desc.clone(),
            long_desc: product.long_desc.clone(),
            thumb: product.thumb.clone(),
            seller_id: product.seller_id,
            category_id: product.category_id,
            discount_id: product.discount.map(|d| d.id),
            discount_percent: product.discount.filter(|d| d.active).map(|d| d.percent),
            price: product.price,
            effective_price: product.effective_price(),
            active: product.active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StockView {
    pub id: i64,
    pub product_id: i64,
    pub size_id: i64,
    pub color_id: i64,
    pub code_id: i64,
    pub quantity: i32,
}

impl From<StockRow> for StockView {
    fn from(row: StockRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            size_id: row.size_id,
            color_id: row.color_id,
            code_id: row.code_id,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryView {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub active: bool,
    /// Breadcrumb from the root, e.g. `Electronics / Phones`.
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryView {
    pub(super) fn build(tree: &CategoryTree, category: &Category) -> Result<Self, CoreError> {
        Ok(Self {
            id: category.id,
            name: category.name.clone(),
            parent_id: category.parent_id,
            description: category.description.clone(),
            active: category.active,
            path: tree.display_path(category.id)?,
            created_at: category.created_at,
            updated_at: category.updated_at,
        })
    }

    pub(super) fn build_all<'a>(
        tree: &CategoryTree,
        categories: impl IntoIterator<Item = &'a Category>,
    ) -> Result<Vec<Self>, CoreError> {
        categories
            .into_iter()
            .map(|category| Self::build(tree, category))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OptionView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OptionRow> for OptionView {
    fn from(row: OptionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DiscountView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub percent: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DiscountRow> for DiscountView {
    fn from(row: DiscountRow) -> Self {
        Self {
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

#[derive(Debug, Serialize)]
pub(super) struct UserView {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            active: user.active,
            joined_at: user.joined_at,
        }
    }
}

/// Fetch every category and index it.
pub(super) async fn load_category_tree(
    pool: &PgPool,
    request_id: &str,
) -> Result<CategoryTree, ApiError> {
    let rows = bazaar_db::list_categories(pool)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;

    Ok(CategoryTree::from_categories(rows.into_iter().map(Category::from)))
}

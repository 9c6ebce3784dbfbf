//! Catalog records as the rest of the workspace sees them, independent of
//! how they are stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::Role;

/// A node in the category hierarchy. `parent_id` is `None` for roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Whole percent taken off the list price, `0..=100`.
    pub percent: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The part of a [`Discount`] that pricing needs, carried on each [`Product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub id: i64,
    pub percent: i32,
    pub active: bool,
}

impl From<&Discount> for AppliedDiscount {
    fn from(discount: &Discount) -> Self {
        Self {
            id: discount.id,
            percent: discount.percent,
            active: discount.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    /// `"{product_id}-{seller_id}"` once the product has been saved by a seller.
    pub sku: Option<String>,
    pub name: String,
    pub cart_desc: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    /// Thumbnail path relative to the configured media root.
    pub thumb: Option<String>,
    pub seller_id: Option<i64>,
    pub category_id: Option<i64>,
    pub discount: Option<AppliedDiscount>,
    /// List price before any discount. Never negative.
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price after the attached discount, if that discount is active.
    ///
    /// Exact `price * (1 - percent / 100)`; callers round for display.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.discount {
            Some(discount) if discount.active => {
                let factor = Decimal::ONE - Decimal::from(discount.percent) / Decimal::ONE_HUNDRED;
                self.price * factor
            }
            _ => self.price,
        }
    }

    /// SKU assigned to a product once both ids are known.
    #[must_use]
    pub fn sku_for(product_id: i64, seller_id: i64) -> String {
        format!("{product_id}-{seller_id}")
    }
}

/// One size/color variant of a product, grouped with sibling variants by `code_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub product_id: i64,
    pub size_id: i64,
    pub color_id: i64,
    pub code_id: i64,
    /// Units on hand. Never negative.
    pub quantity: i32,
}

/// Shared grouping key for the stock rows of one product family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(price: Decimal, discount: Option<AppliedDiscount>) -> Product {
        Product {
            id: 1,
            sku: None,
            name: "Red Shirt".to_string(),
            cart_desc: None,
            short_desc: None,
            long_desc: None,
            thumb: None,
            seller_id: Some(7),
            category_id: None,
            discount,
            price,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_price_without_discount_is_list_price() {
        let product = make_product(Decimal::new(8000, 2), None);
        assert_eq!(product.effective_price(), Decimal::new(80, 0));
    }

    #[test]
    fn effective_price_applies_active_discount() {
        let product = make_product(
            Decimal::new(100, 0),
            Some(AppliedDiscount {
                id: 1,
                percent: 10,
                active: true,
            }),
        );
        assert_eq!(product.effective_price(), Decimal::new(90, 0));
    }

    #[test]
    fn effective_price_ignores_inactive_discount() {
        let product = make_product(
            Decimal::new(100, 0),
            Some(AppliedDiscount {
                id: 1,
                percent: 50,
                active: false,
            }),
        );
        assert_eq!(product.effective_price(), Decimal::new(100, 0));
    }

    #[test]
    fn effective_price_keeps_fractional_cents() {
        let product = make_product(
            Decimal::new(999, 2),
            Some(AppliedDiscount {
                id: 1,
                percent: 33,
                active: true,
            }),
        );
        assert_eq!(product.effective_price(), Decimal::new(66933, 4));
    }

    #[test]
    fn effective_price_does_not_round_half_cents() {
        let product = make_product(
            Decimal::new(25, 2),
            Some(AppliedDiscount {
                id: 1,
                percent: 10,
                active: true,
            }),
        );
        assert_eq!(product.effective_price(), Decimal::new(225, 3));
    }

    #[test]
    fn full_discount_is_free() {
        let product = make_product(
            Decimal::new(4250, 2),
            Some(AppliedDiscount {
                id: 1,
                percent: 100,
                active: true,
            }),
        );
        assert_eq!(product.effective_price(), Decimal::ZERO);
    }

    #[test]
    fn sku_joins_product_and_seller_ids() {
        assert_eq!(Product::sku_for(42, 7), "42-7");
    }
}

//! Offline tests for bazaar-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use bazaar_core::{AppConfig, Category, CoreError, Environment, Product, Role, Stock, User};
use bazaar_db::{CategoryRow, PoolConfig, ProductRow, StockRow, UserRow};
use chrono::Utc;
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn product_row(discount: Option<(i64, i32, bool)>) -> ProductRow {
    ProductRow {
        id: 42,
        sku: Some("42-7".to_string()),
        name: "Linen Shirt".to_string(),
        cart_desc: None,
        short_desc: Some("Breathable".to_string()),
        long_desc: None,
        thumb: Some("thumbs/linen.jpg".to_string()),
        seller_id: Some(7),
        category_id: Some(3),
        discount_id: discount.map(|d| d.0),
        discount_percent: discount.map(|d| d.1),
        discount_active: discount.map(|d| d.2),
        price: Decimal::new(5000, 2),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        media_root: PathBuf::from("./media"),
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        family_page_size: 5,
        storefront_page_size: 12,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn product_row_without_discount_keeps_list_price() {
    let product = Product::from(product_row(None));

    assert!(product.discount.is_none());
    assert_eq!(product.effective_price(), Decimal::new(5000, 2));
    assert_eq!(product.sku.as_deref(), Some("42-7"));
}

#[test]
fn product_row_with_active_discount_lowers_effective_price() {
    let product = Product::from(product_row(Some((1, 20, true))));

    let discount = product.discount.expect("discount mapped");
    assert_eq!(discount.id, 1);
    assert_eq!(discount.percent, 20);
    assert_eq!(product.effective_price(), Decimal::new(4000, 2));
}

#[test]
fn product_row_with_inactive_discount_keeps_list_price() {
    let product = Product::from(product_row(Some((1, 20, false))));

    assert!(product.discount.is_some());
    assert_eq!(product.effective_price(), Decimal::new(5000, 2));
}

#[test]
fn stock_row_converts_field_for_field() {
    let stock = Stock::from(StockRow {
        id: 1,
        product_id: 2,
        size_id: 3,
        color_id: 4,
        code_id: 5,
        quantity: 6,
    });

    assert_eq!(
        (stock.id, stock.product_id, stock.size_id, stock.color_id, stock.code_id),
        (1, 2, 3, 4, 5)
    );
    assert_eq!(stock.quantity, 6);
}

#[test]
fn category_row_converts_to_category() {
    let category = Category::from(CategoryRow {
        id: 3,
        name: "Phones".to_string(),
        parent_id: Some(1),
        description: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    assert_eq!(category.id, 3);
    assert_eq!(category.parent_id, Some(1));
    assert!(category.active);
}

fn user_row(role: &str) -> UserRow {
    UserRow {
        id: 9,
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        role: role.to_string(),
        is_active: true,
        joined_at: Utc::now(),
    }
}

#[test]
fn user_row_with_known_role_converts() {
    let user = User::try_from(user_row("seller")).expect("valid role");
    assert_eq!(user.role, Role::Seller);
    assert!(user.active);
}

#[test]
fn user_row_with_unknown_role_is_rejected() {
    let err = User::try_from(user_row("admin")).expect_err("unknown role");
    assert_eq!(err, CoreError::InvalidRole("admin".to_string()));
}

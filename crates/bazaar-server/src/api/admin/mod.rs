//! Superuser administration.
//!
//! - `GET|POST /api/v1/admin/{sizes,colors}`, `PATCH|DELETE .../{id}`, `PUT .../{id}/active`
//! - `GET|POST /api/v1/admin/categories`, `PATCH|DELETE .../{id}`, `PUT .../{id}/active`
//! - `GET /api/v1/admin/categories/allowed-parents`, `GET .../{id}/allowed-parents`
//! - `GET /api/v1/admin/products` and the shared product edit routes
//! - `GET /api/v1/admin/sellers`, `DELETE|PUT .../{id}[/active]`, `GET .../{id}/products`
//! - `GET /api/v1/admin/customers`, `DELETE|PUT .../{id}[/active]`

mod categories;
mod options;
mod products;
mod users;

use axum::{
    routing::{delete, get, patch, put},
    Router,
};

use crate::middleware::require_superuser;

use super::{products as shared, AppState};

pub(super) fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(option_routes())
        .merge(category_routes())
        .merge(product_routes())
        .merge(user_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.pool.clone(),
            require_superuser,
        ))
}

fn option_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/admin/sizes",
            get(options::list_sizes).post(options::create_size),
        )
        .route(
            "/api/v1/admin/sizes/{id}",
            patch(options::update_size).delete(options::delete_size),
        )
        .route(
            "/api/v1/admin/sizes/{id}/active",
            put(options::set_size_active),
        )
        .route(
            "/api/v1/admin/colors",
            get(options::list_colors).post(options::create_color),
        )
        .route(
            "/api/v1/admin/colors/{id}",
            patch(options::update_color).delete(options::delete_color),
        )
        .route(
            "/api/v1/admin/colors/{id}/active",
            put(options::set_color_active),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/admin/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/admin/categories/allowed-parents",
            get(categories::allowed_parents_for_new),
        )
        .route(
            "/api/v1/admin/categories/{id}",
            patch(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/v1/admin/categories/{id}/active",
            put(categories::set_category_active),
        )
        .route(
            "/api/v1/admin/categories/{id}/allowed-parents",
            get(categories::allowed_parents_for_existing),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/products", get(products::list_products))
        .route(
            "/api/v1/admin/products/{id}",
            patch(shared::update_product).delete(shared::delete_product),
        )
        .route(
            "/api/v1/admin/products/{id}/family",
            delete(shared::delete_family),
        )
        .route(
            "/api/v1/admin/products/{id}/active",
            put(shared::set_product_active),
        )
        .route(
            "/api/v1/admin/products/{id}/family/active",
            put(shared::set_family_active),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/sellers", get(users::list_sellers))
        .route("/api/v1/admin/sellers/{id}", delete(users::delete_seller))
        .route(
            "/api/v1/admin/sellers/{id}/active",
            put(users::set_seller_active),
        )
        .route(
            "/api/v1/admin/sellers/{id}/products",
            get(products::list_seller_products),
        )
        .route("/api/v1/admin/customers", get(users::list_customers))
        .route("/api/v1/admin/customers/{id}", delete(users::delete_customer))
        .route(
            "/api/v1/admin/customers/{id}/active",
            put(users::set_customer_active),
        )
}

//! Seller catalog management.
//!
//! - `GET|POST /api/v1/seller/products`: own code families, create
//! - `PATCH|DELETE /api/v1/seller/products/{id}`: edit or delete one variant
//! - `POST /api/v1/seller/products/{id}/variants`: add a variant to the family
//! - `DELETE /api/v1/seller/products/{id}/family`: delete own rows of the family
//! - `PUT /api/v1/seller/products/{id}/active`: toggle one variant
//! - `PUT /api/v1/seller/products/{id}/family/active`: toggle own rows of the family
//! - `PUT /api/v1/seller/products/{id}/discount`: attach or clear a discount
//! - `GET|POST /api/v1/seller/discounts`: discounts
//! - `PATCH|DELETE /api/v1/seller/discounts/{id}`
//! - `PUT /api/v1/seller/discounts/{id}/active`
//! - `GET /api/v1/seller/lookups`: form choices

mod discounts;
mod lookups;
mod products;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::middleware::require_seller;

use super::{products as shared, AppState};

pub(super) fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/seller/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/seller/products/{id}",
            patch(shared::update_product).delete(shared::delete_product),
        )
        .route(
            "/api/v1/seller/products/{id}/variants",
            post(products::add_variant),
        )
        .route(
            "/api/v1/seller/products/{id}/family",
            delete(shared::delete_family),
        )
        .route(
            "/api/v1/seller/products/{id}/active",
            put(shared::set_product_active),
        )
        .route(
            "/api/v1/seller/products/{id}/family/active",
            put(shared::set_family_active),
        )
        .route(
            "/api/v1/seller/products/{id}/discount",
            put(products::set_discount),
        )
        .route(
            "/api/v1/seller/discounts",
            get(discounts::list_discounts).post(discounts::create_discount),
        )
        .route(
            "/api/v1/seller/discounts/{id}",
            patch(discounts::update_discount).delete(discounts::delete_discount),
        )
        .route(
            "/api/v1/seller/discounts/{id}/active",
            put(discounts::set_discount_active),
        )
        .route("/api/v1/seller/lookups", get(lookups::get_lookups))
        .route_layer(axum::middleware::from_fn_with_state(
            state.pool.clone(),
            require_seller,
        ))
}

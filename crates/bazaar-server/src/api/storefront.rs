//! Public storefront handlers. Only active products are ever shown.
//!
//! - `GET /api/v1/storefront/categories`: root categories
//! - `GET /api/v1/storefront/products`: paginated products
//! - `GET /api/v1/storefront/categories/{id}/products`: products in a category subtree
//! - `GET /api/v1/storefront/products/{id}`: product detail

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use bazaar_core::Product;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    envelope, map_core_error, map_db_error, not_found,
    views::{load_category_tree, CategoryView, ProductView, StockView},
    ApiError, ApiResponse, AppState, Page, PageQuery, Paginated,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/storefront/categories", get(list_categories))
        .route("/api/v1/storefront/products", get(list_products))
        .route(
            "/api/v1/storefront/categories/{id}/products",
            get(list_category_products),
        )
        .route("/api/v1/storefront/products/{id}", get(get_product))
}

#[derive(Debug, Serialize)]
struct VariantView {
    product_id: i64,
    size_id: i64,
    color_id: i64,
    quantity: i32,
    price: Decimal,
    effective_price: Decimal,
}

#[derive(Debug, Serialize)]
struct ProductDetail {
    product: ProductView,
    category_path: Option<String>,
    stock: Option<StockView>,
    /// Active members of the product's code family, this product included.
    variants: Vec<VariantView>,
}

async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ApiError> {
    let tree = load_category_tree(&state.pool, &req_id.0).await?;
    let roots = tree.roots().into_iter().filter(|c| c.active);
    let views =
        CategoryView::build_all(&tree, roots).map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, views))
}

async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<ProductView>>>, ApiError> {
    let page = active_products_page(&state, &req_id.0, None, query.page.as_deref()).await?;
    Ok(envelope(req_id.0, page))
}

/// Includes products filed under any subcategory of `{id}`.
async fn list_category_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<ProductView>>>, ApiError> {
    let tree = load_category_tree(&state.pool, &req_id.0).await?;
    if tree.get(id).is_none() {
        return Err(not_found(&req_id.0, "category"));
    }
    let category_ids: Vec<i64> = tree
        .descendant_ids(id)
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?
        .into_iter()
        .collect();

    let page = active_products_page(
        &state,
        &req_id.0,
        Some(category_ids.as_slice()),
        query.page.as_deref(),
    )
    .await?;
    Ok(envelope(req_id.0, page))
}

async fn active_products_page(
    state: &AppState,
    request_id: &str,
    category_ids: Option<&[i64]>,
    requested_page: Option<&str>,
) -> Result<Paginated<ProductView>, ApiError> {
    let db_err = |e: bazaar_db::DbError| map_db_error(request_id.to_owned(), &e);

    let total = bazaar_db::count_active_products(&state.pool, category_ids)
        .await
        .map_err(db_err)?;
    let page = Page::new(total, state.config.storefront_page_size, requested_page);

    let rows =
        bazaar_db::list_active_products(&state.pool, category_ids, page.per_page, page.offset())
            .await
            .map_err(db_err)?;
    let items = rows
        .into_iter()
        .map(|row| ProductView::from(&Product::from(row)))
        .collect();

    Ok(page.wrap(items))
}

async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let db_err = |e: bazaar_db::DbError| map_db_error(rid.clone(), &e);

    let product = bazaar_db::get_product(&state.pool, id)
        .await
        .map_err(db_err)?
        .map(Product::from)
        .filter(|p| p.active)
        .ok_or_else(|| not_found(rid, "product"))?;

    let category_path = match product.category_id {
        Some(category_id) => {
            let tree = load_category_tree(&state.pool, rid).await?;
            Some(
                tree.display_path(category_id)
                    .map_err(|e| map_core_error(rid.clone(), &e))?,
            )
        }
        None => None,
    };

    let stock = bazaar_db::get_stock_for_product(&state.pool, id)
        .await
        .map_err(db_err)?;

    let variants = match &stock {
        Some(stock) => family_variants(&state, rid, stock.code_id).await?,
        None => Vec::new(),
    };

    Ok(envelope(
        req_id.0,
        ProductDetail {
            product: ProductView::from(&product),
            category_path,
            stock: stock.map(StockView::from),
            variants,
        },
    ))
}

async fn family_variants(
    state: &AppState,
    request_id: &str,
    code_id: i64,
) -> Result<Vec<VariantView>, ApiError> {
    let db_err = |e: bazaar_db::DbError| map_db_error(request_id.to_owned(), &e);

    let stocks = bazaar_db::list_stocks_for_codes(&state.pool, &[code_id])
        .await
        .map_err(db_err)?;
    let product_ids: Vec<i64> = stocks.iter().map(|s| s.product_id).collect();
    let products: Vec<Product> = bazaar_db::list_products_by_ids(&state.pool, &product_ids)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(stocks
        .into_iter()
        .filter_map(|stock| {
            let product = products
                .iter()
                .find(|p| p.id == stock.product_id && p.active)?;
            Some(VariantView {
                product_id: product.id,
                size_id: stock.size_id,
                color_id: stock.color_id,
                quantity: stock.quantity,
                price: product.price,
                effective_price: product.effective_price(),
            })
        })
        .collect())
}

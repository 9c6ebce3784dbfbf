//! Seller-only product handlers: family listing, creation, variants and
//! discounts. Edit, delete and activation handlers are shared with the
//! superuser router.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bazaar_core::{CallerIdentity, Product};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::super::{
    caller_user_id, envelope, families::{list_families, FamilyItem}, map_db_error,
    products::{code_choice, load_managed_product, validate_form, ProductForm},
    validation_error,
    views::{ProductView, StockView},
    ApiError, ApiResponse, AppState, PageQuery, Paginated,
};

#[derive(Debug, Serialize)]
pub(in crate::api) struct CreatedProductResponse {
    pub product: ProductView,
    pub stock: StockView,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct DiscountRequest {
    /// `null` clears the discount.
    pub discount_id: Option<i64>,
}

/// GET /api/v1/seller/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<FamilyItem>>>, ApiError> {
    let user_id = caller_user_id(&req_id.0, &caller)?;
    let page = list_families(&state, &req_id.0, Some(user_id), query.page.as_deref()).await?;
    Ok(envelope(req_id.0, page))
}

/// POST /api/v1/seller/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedProductResponse>>), ApiError> {
    let rid = &req_id.0;
    let user_id = caller_user_id(rid, &caller)?;
    let (draft, stock) = validate_form(rid, &form)?;
    let code = code_choice(rid, &form)?
        .ok_or_else(|| validation_error(rid, "code_id or new_code is required"))?;

    let created = bazaar_db::create_product(&state.pool, user_id, &draft, stock, &code)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        envelope(
            req_id.0,
            CreatedProductResponse {
                product: ProductView::from(&Product::from(created.product)),
                stock: StockView::from(created.stock),
            },
        ),
    ))
}

/// POST /api/v1/seller/products/{id}/variants
///
/// The new product joins the base product's code family; any code fields in
/// the form are ignored.
pub(super) async fn add_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedProductResponse>>), ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;
    let (draft, stock) = validate_form(rid, &form)?;

    let created = bazaar_db::add_variant(&state.pool, id, &draft, stock)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        envelope(
            req_id.0,
            CreatedProductResponse {
                product: ProductView::from(&Product::from(created.product)),
                stock: StockView::from(created.stock),
            },
        ),
    ))
}

/// PUT /api/v1/seller/products/{id}/discount
pub(super) async fn set_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<DiscountRequest>,
) -> Result<Json<ApiResponse<ProductView>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;

    let row = bazaar_db::set_product_discount(&state.pool, id, body.discount_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(envelope(req_id.0, ProductView::from(&Product::from(row))))
}

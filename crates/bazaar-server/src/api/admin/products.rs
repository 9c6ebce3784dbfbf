//! Superuser product listings. Edits go through the shared product handlers.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use bazaar_core::Role;

use crate::middleware::RequestId;

use super::super::{
    envelope,
    families::{list_families, FamilyItem},
    map_db_error, not_found, ApiError, ApiResponse, AppState, PageQuery, Paginated,
};

/// GET /api/v1/admin/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<FamilyItem>>>, ApiError> {
    let page = list_families(&state, &req_id.0, None, query.page.as_deref()).await?;
    Ok(envelope(req_id.0, page))
}

/// GET /api/v1/admin/sellers/{id}/products
pub(super) async fn list_seller_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(seller_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<FamilyItem>>>, ApiError> {
    let seller = bazaar_db::get_user(&state.pool, seller_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if !seller.is_some_and(|user| user.role == Role::Seller.as_str()) {
        return Err(not_found(&req_id.0, "seller"));
    }

    let page = list_families(&state, &req_id.0, Some(seller_id), query.page.as_deref()).await?;
    Ok(envelope(req_id.0, page))
}

//! Seller and customer account administration.
//!
//! Every operation is scoped to the role in the route, so a customer id on
//! a seller route is a 404.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use bazaar_core::{Role, User};
use bazaar_db::SellerSummaryRow;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{media, middleware::RequestId};

use super::super::{
    envelope, map_core_error, map_db_error, views::UserView, ActiveRequest, ActiveResponse,
    ApiError, ApiResponse, AppState, DeletedResponse,
};

#[derive(Debug, Serialize)]
pub(in crate::api) struct SellerView {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
    pub product_count: i64,
    pub code_count: i64,
}

impl From<SellerSummaryRow> for SellerView {
    fn from(row: SellerSummaryRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            active: row.is_active,
            joined_at: row.joined_at,
            product_count: row.product_count,
            code_count: row.code_count,
        }
    }
}

/// GET /api/v1/admin/sellers
pub(super) async fn list_sellers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<SellerView>>>, ApiError> {
    let rows = bazaar_db::list_sellers_with_counts(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        rows.into_iter().map(SellerView::from).collect(),
    ))
}

/// GET /api/v1/admin/customers
pub(super) async fn list_customers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let rows = bazaar_db::list_users_by_role(&state.pool, Role::Customer)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let users = rows
        .into_iter()
        .map(|row| User::try_from(row).map(UserView::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, users))
}

/// DELETE /api/v1/admin/sellers/{id}
///
/// Removes the seller's whole catalog along with the account.
pub(super) async fn delete_seller(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    delete_with_role(&state, req_id, id, Role::Seller).await
}

/// DELETE /api/v1/admin/customers/{id}
pub(super) async fn delete_customer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    delete_with_role(&state, req_id, id, Role::Customer).await
}

/// PUT /api/v1/admin/sellers/{id}/active
pub(super) async fn set_seller_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<ActiveResponse>>, ApiError> {
    set_active_with_role(&state, req_id, id, Role::Seller, body.active).await
}

/// PUT /api/v1/admin/customers/{id}/active
pub(super) async fn set_customer_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<ActiveResponse>>, ApiError> {
    set_active_with_role(&state, req_id, id, Role::Customer, body.active).await
}

async fn delete_with_role(
    state: &AppState,
    req_id: RequestId,
    id: i64,
    role: Role,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let thumbs = bazaar_db::delete_user(&state.pool, id, role)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    media::remove_thumbnails(&state.config.media_root, &thumbs).await;

    Ok(envelope(req_id.0, DeletedResponse { id }))
}

async fn set_active_with_role(
    state: &AppState,
    req_id: RequestId,
    id: i64,
    role: Role,
    active: bool,
) -> Result<Json<ApiResponse<ActiveResponse>>, ApiError> {
    bazaar_db::set_user_active(&state.pool, id, role, active)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, ActiveResponse { id, active }))
}

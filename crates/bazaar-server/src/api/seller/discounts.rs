//! Discount handlers for the seller site.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use bazaar_db::DiscountDraft;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::super::{
    envelope, map_db_error, validation_error, views::DiscountView, ActiveRequest, ApiError,
    ApiResponse, AppState, DeletedResponse,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct DiscountForm {
    pub name: String,
    pub description: Option<String>,
    pub percent: i32,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DiscountActiveResponse {
    pub id: i64,
    pub active: bool,
    /// Products the discount was removed from.
    pub detached: u64,
}

fn validate(request_id: &str, form: DiscountForm) -> Result<DiscountDraft, ApiError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_error(request_id, "name must not be empty"));
    }
    if !(0..=100).contains(&form.percent) {
        return Err(validation_error(request_id, "percent must be between 0 and 100"));
    }
    Ok(DiscountDraft {
        name: name.to_owned(),
        description: form.description,
        percent: form.percent,
        active: form.active,
    })
}

/// GET /api/v1/seller/discounts
pub(super) async fn list_discounts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<DiscountView>>>, ApiError> {
    let rows = bazaar_db::list_discounts(&state.pool, false)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        rows.into_iter().map(DiscountView::from).collect(),
    ))
}

/// POST /api/v1/seller/discounts
pub(super) async fn create_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(form): Json<DiscountForm>,
) -> Result<(StatusCode, Json<ApiResponse<DiscountView>>), ApiError> {
    let draft = validate(&req_id.0, form)?;
    let row = bazaar_db::create_discount(&state.pool, &draft)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        envelope(req_id.0, DiscountView::from(row)),
    ))
}

/// PATCH /api/v1/seller/discounts/{id}
pub(super) async fn update_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(form): Json<DiscountForm>,
) -> Result<Json<ApiResponse<DiscountView>>, ApiError> {
    let draft = validate(&req_id.0, form)?;
    let row = bazaar_db::update_discount(&state.pool, id, &draft)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, DiscountView::from(row)))
}

/// PUT /api/v1/seller/discounts/{id}/active
pub(super) async fn set_discount_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<DiscountActiveResponse>>, ApiError> {
    let detached = bazaar_db::set_discount_active(&state.pool, id, body.active)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        DiscountActiveResponse {
            id,
            active: body.active,
            detached,
        },
    ))
}

/// DELETE /api/v1/seller/discounts/{id}
pub(super) async fn delete_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    bazaar_db::delete_discount(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, DeletedResponse { id }))
}

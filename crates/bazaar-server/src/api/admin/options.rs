//! Size and color management. Both tables share handlers; the route picks
//! the [`OptionKind`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use bazaar_db::{OptionDraft, OptionKind};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::super::{
    envelope, map_db_error, validation_error, views::OptionView, ActiveRequest, ActiveResponse,
    ApiError, ApiResponse, AppState, DeletedResponse,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct OptionForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
}

type ListResult = Result<Json<ApiResponse<Vec<OptionView>>>, ApiError>;
type CreateResult = Result<(StatusCode, Json<ApiResponse<OptionView>>), ApiError>;
type UpdateResult = Result<Json<ApiResponse<OptionView>>, ApiError>;
type ActiveResult = Result<Json<ApiResponse<ActiveResponse>>, ApiError>;
type DeleteResult = Result<Json<ApiResponse<DeletedResponse>>, ApiError>;

fn validate(request_id: &str, kind: OptionKind, form: OptionForm) -> Result<OptionDraft, ApiError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_error(
            request_id,
            format!("{} name must not be empty", kind.as_str()),
        ));
    }
    Ok(OptionDraft {
        name: name.to_owned(),
        description: form.description,
        active: form.active,
    })
}

async fn list(state: AppState, req_id: RequestId, kind: OptionKind) -> ListResult {
    let rows = bazaar_db::list_options(&state.pool, kind)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        rows.into_iter().map(OptionView::from).collect(),
    ))
}

async fn create(state: AppState, req_id: RequestId, kind: OptionKind, form: OptionForm) -> CreateResult {
    let draft = validate(&req_id.0, kind, form)?;
    let row = bazaar_db::create_option(&state.pool, kind, &draft)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, envelope(req_id.0, OptionView::from(row))))
}

async fn update(
    state: AppState,
    req_id: RequestId,
    kind: OptionKind,
    id: i64,
    form: OptionForm,
) -> UpdateResult {
    let draft = validate(&req_id.0, kind, form)?;
    let row = bazaar_db::update_option(&state.pool, kind, id, &draft)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, OptionView::from(row)))
}

async fn set_active(
    state: AppState,
    req_id: RequestId,
    kind: OptionKind,
    id: i64,
    active: bool,
) -> ActiveResult {
    bazaar_db::set_option_active(&state.pool, kind, id, active)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, ActiveResponse { id, active }))
}

/// Deleting an option cascades to its stock rows and products.
async fn remove(state: AppState, req_id: RequestId, kind: OptionKind, id: i64) -> DeleteResult {
    bazaar_db::delete_option(&state.pool, kind, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, DeletedResponse { id }))
}

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

pub(super) async fn list_sizes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> ListResult {
    list(state, req_id, OptionKind::Size).await
}

pub(super) async fn create_size(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(form): Json<OptionForm>,
) -> CreateResult {
    create(state, req_id, OptionKind::Size, form).await
}

pub(super) async fn update_size(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(form): Json<OptionForm>,
) -> UpdateResult {
    update(state, req_id, OptionKind::Size, id, form).await
}

pub(super) async fn set_size_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> ActiveResult {
    set_active(state, req_id, OptionKind::Size, id, body.active).await
}

pub(super) async fn delete_size(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> DeleteResult {
    remove(state, req_id, OptionKind::Size, id).await
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub(super) async fn list_colors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> ListResult {
    list(state, req_id, OptionKind::Color).await
}

pub(super) async fn create_color(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(form): Json<OptionForm>,
) -> CreateResult {
    create(state, req_id, OptionKind::Color, form).await
}

pub(super) async fn update_color(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(form): Json<OptionForm>,
) -> UpdateResult {
    update(state, req_id, OptionKind::Color, id, form).await
}

pub(super) async fn set_color_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> ActiveResult {
    set_active(state, req_id, OptionKind::Color, id, body.active).await
}

pub(super) async fn delete_color(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> DeleteResult {
    remove(state, req_id, OptionKind::Color, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_and_defaults_description() {
        let form: OptionForm =
            serde_json::from_value(serde_json::json!({ "name": " XL " })).expect("form");
        let draft = validate("req", OptionKind::Size, form).expect("valid");
        assert_eq!(draft.name, "XL");
        assert_eq!(draft.description, "");
        assert!(!draft.active);
    }

    #[test]
    fn validate_names_the_option_kind_in_errors() {
        let form = OptionForm {
            name: String::new(),
            description: String::new(),
            active: true,
        };
        let err = validate("req", OptionKind::Color, form).expect_err("blank");
        assert_eq!(err.error.message, "color name must not be empty");
    }
}

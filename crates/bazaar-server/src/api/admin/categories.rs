//! Category management. Parent choices are checked against the in-memory
//! tree so a category can never be moved beneath itself.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use bazaar_core::{CategoryTree, CoreError};
use bazaar_db::CategoryDraft;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::super::{
    envelope, map_core_error, map_db_error, not_found, validation_error,
    views::{load_category_tree, CategoryView},
    ActiveRequest, ActiveResponse, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CategoryForm {
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CategoryDeletedResponse {
    pub id: i64,
    /// The category plus every descendant removed by the cascade.
    pub removed: i64,
}

fn validate(
    request_id: &str,
    tree: &CategoryTree,
    category_id: Option<i64>,
    form: CategoryForm,
) -> Result<CategoryDraft, ApiError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_error(request_id, "name must not be empty"));
    }

    tree.validate_parent(category_id, form.parent_id)
        .map_err(|e| match e {
            CoreError::NotFound { .. } => validation_error(request_id, "parent category not found"),
            other => map_core_error(request_id.to_owned(), &other),
        })?;

    Ok(CategoryDraft {
        name: name.to_owned(),
        parent_id: form.parent_id,
        description: form.description,
        active: form.active,
    })
}

async fn category_view(state: &AppState, request_id: &str, id: i64) -> Result<CategoryView, ApiError> {
    let tree = load_category_tree(&state.pool, request_id).await?;
    let category = tree.get(id).ok_or_else(|| not_found(request_id, "category"))?;
    CategoryView::build(&tree, category).map_err(|e| map_core_error(request_id.to_owned(), &e))
}

/// GET /api/v1/admin/categories
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ApiError> {
    let tree = load_category_tree(&state.pool, &req_id.0).await?;
    let views = CategoryView::build_all(&tree, tree.iter())
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, views))
}

/// POST /api/v1/admin/categories
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryView>>), ApiError> {
    let rid = &req_id.0;
    let tree = load_category_tree(&state.pool, rid).await?;
    let draft = validate(rid, &tree, None, form)?;

    let row = bazaar_db::create_category(&state.pool, &draft)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let view = category_view(&state, rid, row.id).await?;

    Ok((StatusCode::CREATED, envelope(req_id.0, view)))
}

/// PATCH /api/v1/admin/categories/{id}
pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<ApiResponse<CategoryView>>, ApiError> {
    let rid = &req_id.0;
    let tree = load_category_tree(&state.pool, rid).await?;
    if tree.get(id).is_none() {
        return Err(not_found(rid, "category"));
    }
    let draft = validate(rid, &tree, Some(id), form)?;

    bazaar_db::update_category(&state.pool, id, &draft)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let view = category_view(&state, rid, id).await?;

    Ok(envelope(req_id.0, view))
}

/// PUT /api/v1/admin/categories/{id}/active
pub(super) async fn set_category_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<ActiveResponse>>, ApiError> {
    bazaar_db::set_category_active(&state.pool, id, body.active)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        ActiveResponse {
            id,
            active: body.active,
        },
    ))
}

/// DELETE /api/v1/admin/categories/{id}
///
/// Subcategories go with it; products keep existing without a category.
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDeletedResponse>>, ApiError> {
    let removed = bazaar_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, CategoryDeletedResponse { id, removed }))
}

/// GET /api/v1/admin/categories/allowed-parents
pub(super) async fn allowed_parents_for_new(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ApiError> {
    allowed_parents(&state, req_id, None).await
}

/// GET /api/v1/admin/categories/{id}/allowed-parents
pub(super) async fn allowed_parents_for_existing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ApiError> {
    allowed_parents(&state, req_id, Some(id)).await
}

async fn allowed_parents(
    state: &AppState,
    req_id: RequestId,
    editing: Option<i64>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ApiError> {
    let tree = load_category_tree(&state.pool, &req_id.0).await?;
    let views = tree
        .allowed_parents(editing)
        .and_then(|parents| CategoryView::build_all(&tree, parents))
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    Ok(envelope(req_id.0, views))
}

#[cfg(test)]
mod tests {
    use bazaar_core::Category;
    use chrono::Utc;

    use super::*;

    fn category(id: i64, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: format!("c{id}"),
            parent_id,
            description: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tree() -> CategoryTree {
        CategoryTree::from_categories([category(1, None), category(2, Some(1)), category(3, Some(2))])
    }

    fn form(parent_id: Option<i64>) -> CategoryForm {
        CategoryForm {
            name: "Phones".to_string(),
            parent_id,
            description: None,
            active: true,
        }
    }

    #[test]
    fn validate_rejects_descendant_as_parent() {
        let err = validate("req", &tree(), Some(1), form(Some(3))).expect_err("cycle");
        assert_eq!(err.error.code, "validation_error");
    }

    #[test]
    fn validate_rejects_unknown_parent() {
        let err = validate("req", &tree(), None, form(Some(99))).expect_err("unknown");
        assert_eq!(err.error.message, "parent category not found");
    }

    #[test]
    fn validate_allows_moving_to_unrelated_parent() {
        let draft = validate("req", &tree(), Some(3), form(Some(1))).expect("valid");
        assert_eq!(draft.parent_id, Some(1));
    }
}

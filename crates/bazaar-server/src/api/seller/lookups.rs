//! Choices for the seller's product form.

use axum::{extract::State, Extension, Json};
use bazaar_db::OptionKind;
use serde::Serialize;

use crate::middleware::RequestId;

use super::super::{
    envelope, map_core_error, map_db_error,
    views::{load_category_tree, CategoryView, DiscountView, OptionView},
    ApiError, ApiResponse, AppState,
};

#[derive(Debug, Serialize)]
pub(in crate::api) struct CodeView {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct Lookups {
    pub sizes: Vec<OptionView>,
    pub colors: Vec<OptionView>,
    pub codes: Vec<CodeView>,
    pub discounts: Vec<DiscountView>,
    pub categories: Vec<CategoryView>,
}

/// GET /api/v1/seller/lookups
///
/// Active sizes, colors and discounts; every code and category.
pub(super) async fn get_lookups(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Lookups>>, ApiError> {
    let rid = &req_id.0;
    let db_err = |e: bazaar_db::DbError| map_db_error(rid.clone(), &e);

    let active_options = |rows: Vec<bazaar_db::OptionRow>| -> Vec<OptionView> {
        rows.into_iter()
            .filter(|row| row.active)
            .map(OptionView::from)
            .collect()
    };
    let sizes = active_options(
        bazaar_db::list_options(&state.pool, OptionKind::Size)
            .await
            .map_err(db_err)?,
    );
    let colors = active_options(
        bazaar_db::list_options(&state.pool, OptionKind::Color)
            .await
            .map_err(db_err)?,
    );
    let codes = bazaar_db::list_codes(&state.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|row| CodeView {
            id: row.id,
            name: row.name,
        })
        .collect();
    let discounts = bazaar_db::list_discounts(&state.pool, true)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(DiscountView::from)
        .collect();

    let tree = load_category_tree(&state.pool, rid).await?;
    let categories =
        CategoryView::build_all(&tree, tree.iter()).map_err(|e| map_core_error(rid.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        Lookups {
            sizes,
            colors,
            codes,
            discounts,
            categories,
        },
    ))
}

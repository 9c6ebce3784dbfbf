//! Product management handlers shared by the seller and superuser routers.
//!
//! Sellers may only touch their own products and family operations are
//! limited to their own rows; superusers act on everything.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use bazaar_core::{CallerIdentity, Product, Role};
use bazaar_db::{CodeChoice, ProductDraft, ProductRow, StockDraft};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{media, middleware::RequestId};

use super::{
    envelope, map_db_error, not_found, validation_error, views::ProductView, ActiveRequest,
    ActiveResponse, ApiError, ApiResponse, AppState, DeletedResponse,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// The product form: product fields, its stock row, and its code family.
#[derive(Debug, Deserialize)]
pub(super) struct ProductForm {
    pub name: String,
    pub cart_desc: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    /// Path under the media root of an already uploaded image.
    pub thumb: Option<String>,
    pub category_id: Option<i64>,
    pub price: Decimal,
    #[serde(default)]
    pub active: bool,
    pub size_id: i64,
    pub color_id: i64,
    pub quantity: i32,
    pub code_id: Option<i64>,
    pub new_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct FamilyUpdateResponse {
    pub code_member_id: i64,
    pub updated: u64,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct FamilyDeletedResponse {
    pub product_count: u64,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub(super) fn validate_form(
    request_id: &str,
    form: &ProductForm,
) -> Result<(ProductDraft, StockDraft), ApiError> {
    let name = form.name.trim();
    if name.is_empty() || name.chars().count() > 200 {
        return Err(validation_error(request_id, "name must be 1-200 characters"));
    }
    if form.price.is_sign_negative() {
        return Err(validation_error(request_id, "price must not be negative"));
    }
    if form.quantity < 0 {
        return Err(validation_error(request_id, "quantity must not be negative"));
    }
    if let Some(thumb) = &form.thumb {
        if !media::is_safe_relative(thumb) {
            return Err(validation_error(
                request_id,
                "thumb must be a relative path inside the media root",
            ));
        }
    }

    let draft = ProductDraft {
        name: name.to_owned(),
        cart_desc: form.cart_desc.clone(),
        short_desc: form.short_desc.clone(),
        long_desc: form.long_desc.clone(),
        thumb: form.thumb.clone(),
        category_id: form.category_id,
        price: form
            .price
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        active: form.active,
    };
    let stock = StockDraft {
        size_id: form.size_id,
        color_id: form.color_id,
        quantity: form.quantity,
    };
    Ok((draft, stock))
}

/// At most one of `code_id` and `new_code`.
pub(super) fn code_choice(
    request_id: &str,
    form: &ProductForm,
) -> Result<Option<CodeChoice>, ApiError> {
    match (form.code_id, form.new_code.as_deref().map(str::trim)) {
        (Some(_), Some(_)) => Err(validation_error(
            request_id,
            "provide either code_id or new_code, not both",
        )),
        (Some(id), None) => Ok(Some(CodeChoice::Existing(id))),
        (None, Some("")) => Err(validation_error(request_id, "new_code must be non-empty")),
        (None, Some(name)) => Ok(Some(CodeChoice::New(name.to_owned()))),
        (None, None) => Ok(None),
    }
}

/// Sellers are limited to their own rows in family-wide operations.
pub(super) fn seller_scope(caller: &CallerIdentity) -> Option<i64> {
    match caller.role {
        Role::Seller => caller.user_id,
        Role::Superuser | Role::Customer => None,
    }
}

/// Load a product the caller may edit: 404 when absent, 403 when owned by
/// someone else.
pub(super) async fn load_managed_product(
    state: &AppState,
    request_id: &str,
    caller: &CallerIdentity,
    id: i64,
) -> Result<ProductRow, ApiError> {
    let row = bazaar_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| not_found(request_id, "product"))?;

    if !caller.may_manage_product(row.seller_id) {
        return Err(ApiError::new(
            request_id,
            "forbidden",
            "product belongs to another seller",
        ));
    }
    Ok(row)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// PATCH .../products/{id}: save the product form.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(form): Json<ProductForm>,
) -> Result<Json<ApiResponse<ProductView>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;
    let (draft, stock) = validate_form(rid, &form)?;
    let code = code_choice(rid, &form)?;

    let row = bazaar_db::update_product(&state.pool, id, &draft, stock, code.as_ref())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(product_id = id, user_id = ?caller.user_id, "product updated");
    Ok(envelope(req_id.0, ProductView::from(&Product::from(row))))
}

/// DELETE .../products/{id}: delete one product and its thumbnail.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;

    let thumb = bazaar_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if let Some(thumb) = thumb {
        media::remove_thumbnail(&state.config.media_root, &thumb).await;
    }

    Ok(envelope(req_id.0, DeletedResponse { id }))
}

/// DELETE .../products/{id}/family: delete the product's whole code family.
pub(super) async fn delete_family(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FamilyDeletedResponse>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;

    let deletion = bazaar_db::delete_family(&state.pool, id, seller_scope(&caller))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    media::remove_thumbnails(&state.config.media_root, &deletion.thumbs).await;

    Ok(envelope(
        req_id.0,
        FamilyDeletedResponse {
            product_count: deletion.product_count,
        },
    ))
}

/// PUT .../products/{id}/active
pub(super) async fn set_product_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<ActiveResponse>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;

    bazaar_db::set_product_active(&state.pool, id, body.active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        ActiveResponse {
            id,
            active: body.active,
        },
    ))
}

/// PUT .../products/{id}/family/active
pub(super) async fn set_family_active(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<ApiResponse<FamilyUpdateResponse>>, ApiError> {
    let rid = &req_id.0;
    load_managed_product(&state, rid, &caller, id).await?;

    let updated = bazaar_db::set_family_active(&state.pool, id, seller_scope(&caller), body.active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(envelope(
        req_id.0,
        FamilyUpdateResponse {
            code_member_id: id,
            updated,
            active: body.active,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        serde_json::from_value(serde_json::json!({
            "name": "  Linen Shirt ",
            "price": "49.999",
            "size_id": 1,
            "color_id": 2,
            "quantity": 3
        }))
        .expect("valid form")
    }

    #[test]
    fn validate_form_trims_name_and_rounds_price() {
        let (draft, stock) = validate_form("req", &form()).expect("valid");
        assert_eq!(draft.name, "Linen Shirt");
        assert_eq!(draft.price, Decimal::new(5000, 2));
        assert!(!draft.active);
        assert_eq!(stock.quantity, 3);
    }

    #[test]
    fn validate_form_rounds_half_cent_prices_up() {
        let mut f = form();
        f.price = Decimal::new(125, 3);
        let (draft, _) = validate_form("req", &f).expect("valid");
        assert_eq!(draft.price, Decimal::new(13, 2));
    }

    #[test]
    fn validate_form_counts_name_length_in_characters() {
        let mut f = form();
        f.name = "\u{642}".repeat(150);
        assert!(validate_form("req", &f).is_ok());

        f.name = "\u{642}".repeat(201);
        let err = validate_form("req", &f).expect_err("too long");
        assert_eq!(err.error.code, "validation_error");

        f.name = "a".repeat(200);
        assert!(validate_form("req", &f).is_ok());
    }

    #[test]
    fn validate_form_rejects_negative_price_and_quantity() {
        let mut bad = form();
        bad.price = Decimal::new(-1, 0);
        assert!(validate_form("req", &bad).is_err());

        let mut bad = form();
        bad.quantity = -1;
        assert!(validate_form("req", &bad).is_err());
    }

    #[test]
    fn validate_form_rejects_escaping_thumbnail() {
        let mut bad = form();
        bad.thumb = Some("../secrets.txt".to_string());
        let err = validate_form("req", &bad).expect_err("unsafe thumb");
        assert_eq!(err.error.code, "validation_error");
    }

    #[test]
    fn code_choice_accepts_exactly_one_source() {
        let mut f = form();
        assert_eq!(code_choice("req", &f).expect("none"), None);

        f.code_id = Some(7);
        assert_eq!(
            code_choice("req", &f).expect("existing"),
            Some(CodeChoice::Existing(7))
        );

        f.new_code = Some("RED".to_string());
        assert!(code_choice("req", &f).is_err());

        f.code_id = None;
        assert_eq!(
            code_choice("req", &f).expect("new"),
            Some(CodeChoice::New("RED".to_string()))
        );

        f.new_code = Some("   ".to_string());
        assert!(code_choice("req", &f).is_err());
    }

    #[test]
    fn seller_scope_only_limits_sellers() {
        assert_eq!(seller_scope(&CallerIdentity::user(4, Role::Seller)), Some(4));
        assert_eq!(seller_scope(&CallerIdentity::user(1, Role::Superuser)), None);
    }
}

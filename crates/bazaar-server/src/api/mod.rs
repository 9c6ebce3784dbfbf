mod admin;
mod families;
mod products;
mod seller;
mod storefront;
mod views;

use std::{ops::Range, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use bazaar_core::{AppConfig, CallerIdentity, CoreError};
use bazaar_db::DbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, resolve_identity, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn envelope<T: Serialize>(request_id: String, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(request_id),
    })
}

pub(super) fn validation_error(request_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

pub(super) fn not_found(request_id: &str, what: &str) -> ApiError {
    ApiError::new(request_id, "not_found", format!("{what} not found"))
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::InactiveDiscount(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        DbError::Core(core) => map_core_error(request_id, core),
        DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            ApiError::new(request_id, "conflict", "a record with that value already exists")
        }
        DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23503") => {
            ApiError::new(
                request_id,
                "validation_error",
                "a referenced record does not exist",
            )
        }
        DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23514") => {
            ApiError::new(request_id, "validation_error", "a value is out of range")
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_core_error(request_id: String, error: &CoreError) -> ApiError {
    match error {
        CoreError::NotFound { .. } => ApiError::new(request_id, "not_found", error.to_string()),
        CoreError::InvalidParent { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        CoreError::CyclicHierarchy { category_id } => {
            tracing::error!(category_id, "category hierarchy contains a cycle");
            ApiError::new(request_id, "internal_error", "category hierarchy is corrupted")
        }
        CoreError::InvalidRole(role) => {
            tracing::error!(role = %role, "stored user role is invalid");
            ApiError::new(request_id, "internal_error", "stored user record is invalid")
        }
    }
}

/// The caller's user id; role gates guarantee it on seller and admin routes.
pub(super) fn caller_user_id(request_id: &str, caller: &CallerIdentity) -> Result<i64, ApiError> {
    caller.user_id.ok_or_else(|| {
        ApiError::new(request_id, "unauthorized", "missing or invalid bearer token")
    })
}

// ---------------------------------------------------------------------------
// Shared request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ActiveResponse {
    pub id: i64,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedResponse {
    pub id: i64,
}

/// `?page=` as sent by the client. Anything that is not a positive integer
/// falls back to the first page.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    pub page: Option<String>,
}

/// A resolved page: 1-based, clamped to the available pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Page {
    pub number: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl Page {
    pub(super) fn new(total_items: i64, per_page: usize, requested: Option<&str>) -> Self {
        let per_page = i64::try_from(per_page).unwrap_or(i64::MAX).max(1);
        let total_items = total_items.max(0);
        let total_pages = (total_items / per_page + i64::from(total_items % per_page != 0)).max(1);
        let number = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, total_pages);

        Self {
            number,
            per_page,
            total_items,
            total_pages,
        }
    }

    pub(super) fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    /// Index range of this page within an in-memory list of `total_items`.
    pub(super) fn range(&self) -> Range<usize> {
        let total = usize::try_from(self.total_items).unwrap_or(0);
        let start = usize::try_from(self.offset()).unwrap_or(0).min(total);
        let len = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        start..start.saturating_add(len).min(total)
    }

    pub(super) fn wrap<T: Serialize>(self, items: Vec<T>) -> Paginated<T> {
        Paginated {
            items,
            page: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    let management_routes = Router::new()
        .merge(seller::routes(&state))
        .merge(admin::routes(&state))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(storefront::routes())
        .merge(management_routes)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn_with_state(auth, resolve_identity)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match bazaar_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

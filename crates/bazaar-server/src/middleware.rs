use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bazaar_core::{CallerIdentity, Role};
use bazaar_db::UserRow;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct ApiKey {
    digest: [u8; 32],
    identity: CallerIdentity,
}

/// Bearer token to caller identity mapping used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Arc<Vec<ApiKey>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `BAZAAR_API_KEYS`.
    ///
    /// In development, empty/missing keys disable auth for local iteration and
    /// every caller is anonymous. In non-development envs, empty/missing keys
    /// fail startup.
    ///
    /// # Errors
    ///
    /// Fails when an entry is malformed, or when no keys are configured
    /// outside development.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("BAZAAR_API_KEYS").unwrap_or_default();
        Self::from_raw(&raw, is_development)
    }

    /// Parses comma-separated `token=role:user_id` entries.
    ///
    /// # Errors
    ///
    /// Same as [`AuthState::from_env`].
    pub fn from_raw(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_key_entry)
            .collect::<anyhow::Result<Vec<_>>>()?;

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "BAZAAR_API_KEYS not set; every caller is an anonymous customer in development"
                );
                return Ok(Self {
                    keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "BAZAAR_API_KEYS is required outside development; provide comma-separated token=role:user_id entries"
            );
        }

        Ok(Self {
            keys: Arc::new(keys),
            enabled: true,
        })
    }

    /// Compares against every configured digest so the lookup time does not
    /// depend on which key matched.
    fn identify(&self, token: &str) -> Option<CallerIdentity> {
        let digest: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        let mut found = None;
        for key in self.keys.iter() {
            if bool::from(key.digest[..].ct_eq(&digest[..])) {
                found = Some(key.identity);
            }
        }
        found
    }
}

fn parse_key_entry(entry: &str) -> anyhow::Result<ApiKey> {
    let (token, identity) = entry
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("API key entry must look like token=role:user_id"))?;
    let (role, user_id) = identity
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("API key identity must look like role:user_id"))?;

    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("API key token must be non-empty");
    }
    let role: Role = role.trim().parse()?;
    let user_id: i64 = user_id
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid user id in API key entry: {e}"))?;

    Ok(ApiKey {
        digest: Sha256::digest(token.as_bytes()).into(),
        identity: CallerIdentity::user(user_id, role),
    })
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware that resolves the bearer token into a [`CallerIdentity`]
/// request extension.
///
/// Requests without a token are anonymous customers. An unknown token is
/// rejected when auth is enabled.
pub async fn resolve_identity(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.enabled => match auth.identify(token) {
            Some(identity) => identity,
            None => {
                return reject(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "missing or invalid bearer token",
                )
            }
        },
        _ => CallerIdentity::anonymous(),
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Route layer admitting only active sellers.
pub async fn require_seller(State(pool): State<PgPool>, req: Request, next: Next) -> Response {
    require_role(&pool, Role::Seller, req, next).await
}

/// Route layer admitting only active superusers.
pub async fn require_superuser(State(pool): State<PgPool>, req: Request, next: Next) -> Response {
    require_role(&pool, Role::Superuser, req, next).await
}

/// The token's role must match the route, and the stored account must still
/// exist, be active and carry that same role.
async fn require_role(pool: &PgPool, role: Role, req: Request, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<CallerIdentity>()
        .copied()
        .unwrap_or_else(CallerIdentity::anonymous);

    let Some(user_id) = identity.user_id else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        );
    };
    if identity.role != role {
        return reject(
            StatusCode::FORBIDDEN,
            "forbidden",
            "caller role may not use this endpoint",
        );
    }

    let user = match bazaar_db::get_user(pool, user_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(user_id, error = %e, "failed to load caller account");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "database query failed",
            );
        }
    };
    if !account_admits(user.as_ref(), role) {
        tracing::warn!(user_id, role = role.as_str(), "rejected inactive or mismatched account");
        return reject(
            StatusCode::FORBIDDEN,
            "forbidden",
            "account is inactive or lacks this role",
        );
    }

    next.run(req).await
}

fn account_admits(user: Option<&UserRow>, role: Role) -> bool {
    user.is_some_and(|u| u.is_active && u.role == role.as_str())
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_raw("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_raw(" , ", false).is_err());
    }

    #[test]
    fn auth_state_maps_tokens_to_identities() {
        let state = AuthState::from_raw("s3cret=seller:4, root=superuser:1", false)
            .expect("valid entries");

        assert_eq!(
            state.identify("s3cret"),
            Some(CallerIdentity::user(4, Role::Seller))
        );
        assert_eq!(
            state.identify("root"),
            Some(CallerIdentity::user(1, Role::Superuser))
        );
        assert_eq!(state.identify("guess"), None);
    }

    fn user_row(role: &str, is_active: bool) -> UserRow {
        UserRow {
            id: 4,
            email: "s@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Seller".to_string(),
            role: role.to_string(),
            is_active,
            joined_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn account_admits_only_active_matching_role() {
        assert!(account_admits(Some(&user_row("seller", true)), Role::Seller));
        assert!(!account_admits(Some(&user_row("seller", false)), Role::Seller));
        assert!(!account_admits(Some(&user_row("customer", true)), Role::Seller));
        assert!(!account_admits(None, Role::Superuser));
    }

    #[test]
    fn auth_state_rejects_unknown_role() {
        let err = AuthState::from_raw("tok=admin:1", false).expect_err("admin is not a role");
        assert!(err.to_string().contains("invalid role"), "{err}");
    }

    #[test]
    fn auth_state_rejects_entry_without_identity() {
        assert!(AuthState::from_raw("just-a-token", false).is_err());
        assert!(AuthState::from_raw("tok=seller", false).is_err());
        assert!(AuthState::from_raw("tok=seller:abc", false).is_err());
    }
}

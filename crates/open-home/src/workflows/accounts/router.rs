use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{Credentials, PasswordChange, Registration, UserAccount, UserProfile};
use super::service::{AccountError, AccountService};
use super::store::AccountStore;

/// Router builder exposing the `/api/auth` endpoints.
pub fn account_router<S>(service: Arc<AccountService<S>>) -> Router
where
    S: AccountStore + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register_handler::<S>))
        .route("/api/auth/login", post(login_handler::<S>))
        .route("/api/auth/refresh", post(refresh_handler::<S>))
        .route("/api/auth/logout", post(logout_handler::<S>))
        .route("/api/auth/logout-all", post(logout_all_handler::<S>))
        .route(
            "/api/auth/me",
            get(me_handler::<S>).put(update_profile_handler::<S>),
        )
        .route("/api/auth/change-password", post(change_password_handler::<S>))
        .route("/api/auth/validate-token", get(validate_token_handler::<S>))
        .route("/api/auth/sessions", get(sessions_handler::<S>))
        .with_state(service)
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller or produce the 401 response to send back.
pub fn require_user<S>(
    service: &AccountService<S>,
    headers: &HeaderMap,
) -> Result<UserAccount, Response>
where
    S: AccountStore + 'static,
{
    let token = bearer_token(headers).ok_or_else(|| unauthorized("authentication required"))?;
    match service.authenticate(token, Utc::now()) {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(unauthorized("invalid or expired token")),
        Err(err) => Err(account_error_response(err)),
    }
}

pub(crate) fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn account_error_response(err: AccountError) -> Response {
    let status = match &err {
        AccountError::InvalidEmail
        | AccountError::WeakPassword
        | AccountError::IncorrectPassword => StatusCode::BAD_REQUEST,
        AccountError::EmailTaken => StatusCode::CONFLICT,
        AccountError::InvalidCredentials | AccountError::InvalidToken => StatusCode::UNAUTHORIZED,
        AccountError::Locked { .. } => StatusCode::LOCKED,
        AccountError::Inactive => StatusCode::FORBIDDEN,
        AccountError::Store(_) | AccountError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    pub(crate) refresh_token: String,
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    Json(registration): Json<Registration>,
) -> Response
where
    S: AccountStore + 'static,
{
    match service.register(registration, Utc::now()) {
        Ok((user, tokens)) => (
            StatusCode::CREATED,
            Json(json!({ "user": user, "tokens": tokens })),
        )
            .into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn login_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    S: AccountStore + 'static,
{
    match service.login(credentials, Utc::now()) {
        Ok((user, tokens)) => {
            (StatusCode::OK, Json(json!({ "user": user, "tokens": tokens }))).into_response()
        }
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn refresh_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    Json(request): Json<RefreshRequest>,
) -> Response
where
    S: AccountStore + 'static,
{
    match service.refresh(&request.refresh_token, Utc::now()) {
        Ok(tokens) => (StatusCode::OK, Json(tokens)).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn logout_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: AccountStore + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("authentication required");
    };
    match service.logout(token) {
        Ok(logged_out) => {
            (StatusCode::OK, Json(json!({ "logged_out": logged_out }))).into_response()
        }
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn logout_all_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: AccountStore + 'static,
{
    let account = match require_user(&service, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match service.logout_all(account.id) {
        Ok(closed) => {
            (StatusCode::OK, Json(json!({ "sessions_closed": closed }))).into_response()
        }
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn me_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: AccountStore + 'static,
{
    match require_user(&service, &headers) {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn sessions_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: AccountStore + 'static,
{
    let account = match require_user(&service, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match service.sessions(account.id, Utc::now()) {
        Ok(sessions) => {
            (StatusCode::OK, Json(json!({ "sessions": sessions }))).into_response()
        }
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn update_profile_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
    Json(update): Json<UserProfile>,
) -> Response
where
    S: AccountStore + 'static,
{
    let account = match require_user(&service, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match service.update_profile(account.id, update) {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn change_password_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
    Json(change): Json<PasswordChange>,
) -> Response
where
    S: AccountStore + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("authentication required");
    };
    match service.change_password(token, change, Utc::now()) {
        Ok(closed) => (
            StatusCode::OK,
            Json(json!({ "message": "password changed", "sessions_closed": closed })),
        )
            .into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn validate_token_handler<S>(
    State(service): State<Arc<AccountService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: AccountStore + 'static,
{
    let validated = match bearer_token(&headers) {
        Some(token) => service.validate_token(token, Utc::now()),
        None => Ok(None),
    };
    match validated {
        Ok(Some(user)) => {
            (StatusCode::OK, Json(json!({ "valid": true, "user": user }))).into_response()
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "message": "token is invalid or expired" })),
        )
            .into_response(),
        Err(err) => account_error_response(err),
    }
}

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::workflows::accounts::{require_user, AccountService, AccountStore};

use super::domain::{NewCriteria, NewProperty};
use super::repository::PortfolioRepository;
use super::service::{PortfolioError, PortfolioService, DEFAULT_HISTORY_LIMIT};

/// Shared handler state: the portfolio plus the accounts used to resolve callers.
pub struct PortfolioState<R, S> {
    pub portfolio: Arc<PortfolioService<R>>,
    pub accounts: Arc<AccountService<S>>,
}

impl<R, S> Clone for PortfolioState<R, S> {
    fn clone(&self) -> Self {
        Self {
            portfolio: Arc::clone(&self.portfolio),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

pub fn portfolio_router<R, S>(
    portfolio: Arc<PortfolioService<R>>,
    accounts: Arc<AccountService<S>>,
) -> Router
where
    R: PortfolioRepository + 'static,
    S: AccountStore + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            get(list_properties_handler::<R, S>).post(create_property_handler::<R, S>),
        )
        .route("/api/analysis-history", get(history_handler::<R, S>))
        .route("/api/criteria", post(save_criteria_handler::<R, S>))
        .with_state(PortfolioState {
            portfolio,
            accounts,
        })
}

pub fn portfolio_error_response(err: PortfolioError) -> Response {
    let status = match &err {
        PortfolioError::InvalidProperty(_) | PortfolioError::InvalidCriteria(_) => {
            StatusCode::BAD_REQUEST
        }
        PortfolioError::PropertyNotFound(_) => StatusCode::NOT_FOUND,
        PortfolioError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn list_properties_handler<R, S>(
    State(state): State<PortfolioState<R, S>>,
    headers: HeaderMap,
) -> Response
where
    R: PortfolioRepository + 'static,
    S: AccountStore + 'static,
{
    let account = match require_user(&state.accounts, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match state.portfolio.properties_for(account.id) {
        Ok(properties) => {
            (StatusCode::OK, Json(json!({ "properties": properties }))).into_response()
        }
        Err(err) => portfolio_error_response(err),
    }
}

pub(crate) async fn create_property_handler<R, S>(
    State(state): State<PortfolioState<R, S>>,
    headers: HeaderMap,
    Json(new_property): Json<NewProperty>,
) -> Response
where
    R: PortfolioRepository + 'static,
    S: AccountStore + 'static,
{
    let account = match require_user(&state.accounts, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match state
        .portfolio
        .create_property(account.id, new_property, Utc::now())
    {
        Ok(property) => (StatusCode::CREATED, Json(property)).into_response(),
        Err(err) => portfolio_error_response(err),
    }
}

pub(crate) async fn history_handler<R, S>(
    State(state): State<PortfolioState<R, S>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    R: PortfolioRepository + 'static,
    S: AccountStore + 'static,
{
    let account = match require_user(&state.accounts, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    match state.portfolio.analysis_history(account.id, limit) {
        Ok(history) => {
            (StatusCode::OK, Json(json!({ "analyses": history }))).into_response()
        }
        Err(err) => portfolio_error_response(err),
    }
}

pub(crate) async fn save_criteria_handler<R, S>(
    State(state): State<PortfolioState<R, S>>,
    headers: HeaderMap,
    Json(new_criteria): Json<NewCriteria>,
) -> Response
where
    R: PortfolioRepository + 'static,
    S: AccountStore + 'static,
{
    let account = match require_user(&state.accounts, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match state
        .portfolio
        .save_criteria(account.id, new_criteria, Utc::now())
    {
        Ok(criteria) => {
            (StatusCode::CREATED, Json(json!({ "criteria": criteria }))).into_response()
        }
        Err(err) => portfolio_error_response(err),
    }
}

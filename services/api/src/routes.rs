use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate, Utc};
use open_home::error::AppError;
use open_home::workflows::accounts::{account_router, bearer_token, require_user, UserId};
use open_home::workflows::inspections::{
    parse_date, AnalysisError, AnalysisSummary, CompetitionAnalysis, CriteriaSpecs,
    InspectionQuery, InspectionRecord, SimilarityCriteria, TimeSlot, TimeWindow,
    DEFAULT_WINDOW_END, DEFAULT_WINDOW_START,
};
use open_home::workflows::portfolio::{
    portfolio_error_response, portfolio_router, AnalysisDraft, AnalysisId, PropertyId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Address used when the mock endpoint is called without one.
pub(crate) const MOCK_ADDRESS: &str = "Sydney, 2000";

pub(crate) fn with_open_home_routes(state: &AppState) -> Router {
    account_router(state.accounts.clone())
        .merge(portfolio_router(
            state.portfolio.clone(),
            state.accounts.clone(),
        ))
        .route("/health", get(healthcheck))
        .route("/api/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/inspections", get(inspections_endpoint))
        .route("/api/mock-data", get(mock_data_endpoint))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InspectionParams {
    pub(crate) address: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) similar_bedrooms: Option<String>,
    pub(crate) similar_bathrooms: Option<String>,
    pub(crate) similar_car_spots: Option<String>,
    pub(crate) property_id: Option<u64>,
}

impl InspectionParams {
    fn has_criteria(&self) -> bool {
        [
            &self.similar_bedrooms,
            &self.similar_bathrooms,
            &self.similar_car_spots,
        ]
        .into_iter()
        .any(|spec| present(spec).is_some())
    }
}

/// Validated inputs for one analysis run.
#[derive(Debug)]
pub(crate) struct AnalysisRequest {
    pub(crate) query: InspectionQuery,
    pub(crate) criteria: SimilarityCriteria,
    pub(crate) window: TimeWindow,
    pub(crate) time_filter: TimeFilter,
}

impl AnalysisRequest {
    /// `address` and `date` fall back to the given defaults when absent.
    pub(crate) fn from_params(
        params: &InspectionParams,
        default_address: Option<&str>,
        default_date: Option<NaiveDate>,
    ) -> Result<Self, AnalysisError> {
        let address = present(&params.address)
            .or(default_address)
            .ok_or(AnalysisError::MissingParameter("address is required"))?;
        let date = match (present(&params.date), default_date) {
            (Some(raw), _) => parse_date(raw)?,
            (None, Some(date)) => date,
            (None, None) => return Err(AnalysisError::MissingParameter("date is required")),
        };

        let defaults = CriteriaSpecs::default();
        let criteria = SimilarityCriteria::parse(CriteriaSpecs {
            bedrooms: spec_or(&params.similar_bedrooms, defaults.bedrooms),
            bathrooms: spec_or(&params.similar_bathrooms, defaults.bathrooms),
            car_spots: spec_or(&params.similar_car_spots, defaults.car_spots),
        })?;

        let time_filter = TimeFilter {
            start: spec_or(&params.start_time, DEFAULT_WINDOW_START.to_string()),
            end: spec_or(&params.end_time, DEFAULT_WINDOW_END.to_string()),
        };
        let window = TimeWindow::parse(&time_filter.start, &time_filter.end)?;

        Ok(Self {
            query: InspectionQuery::new(address.trim(), date),
            criteria,
            window,
            time_filter,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|raw| !raw.trim().is_empty())
}

fn spec_or(value: &Option<String>, default: String) -> String {
    present(value).map(str::to_string).unwrap_or(default)
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TimeFilter {
    pub(crate) start: String,
    pub(crate) end: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchParams {
    pub(crate) address: String,
    pub(crate) suburb: String,
    pub(crate) postcode: String,
    pub(crate) date: String,
    pub(crate) time_filter: TimeFilter,
    pub(crate) similar_property_criteria: CriteriaSpecs,
}

#[derive(Debug, Serialize)]
pub(crate) struct InspectionsResponse {
    pub(crate) inspections: Vec<InspectionRecord>,
    pub(crate) filtered_inspections: Vec<InspectionRecord>,
    pub(crate) competition_analysis: Vec<TimeSlot>,
    pub(crate) recommendations: Vec<TimeSlot>,
    pub(crate) total_inspections: usize,
    pub(crate) similar_inspections: usize,
    pub(crate) summary: AnalysisSummary,
    pub(crate) search_params: SearchParams,
    pub(crate) data_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) analysis_id: Option<AnalysisId>,
    pub(crate) saved_to_database: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) is_mock_data: bool,
}

impl InspectionsResponse {
    fn build(
        request: AnalysisRequest,
        inspections: Vec<InspectionRecord>,
        data_source: &'static str,
        analysis: CompetitionAnalysis,
    ) -> Self {
        let summary = analysis.summary(inspections.len());
        let AnalysisRequest {
            query,
            criteria,
            time_filter,
            ..
        } = request;
        let date = query.date_label();

        Self {
            total_inspections: inspections.len(),
            similar_inspections: analysis.filtered_inspections.len(),
            inspections,
            filtered_inspections: analysis.filtered_inspections,
            competition_analysis: analysis.competition_analysis,
            recommendations: analysis.recommendations,
            summary,
            search_params: SearchParams {
                address: query.address,
                suburb: query.locality.suburb,
                postcode: query.locality.postcode,
                date,
                time_filter,
                similar_property_criteria: criteria.specs().clone(),
            },
            data_source,
            analysis_id: None,
            saved_to_database: false,
            is_mock_data: false,
        }
    }
}

pub(crate) async fn healthcheck(
    Extension(state): Extension<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "data_source": state.sources.data_source(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn inspections_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Query(params): Query<InspectionParams>,
) -> Response {
    let mut request = match AnalysisRequest::from_params(&params, None, None) {
        Ok(request) => request,
        Err(err) => return AppError::from(err).into_response(),
    };

    // Only an authenticated owner of `property_id` gets the run saved.
    let owner = match (params.property_id, bearer_token(&headers)) {
        (Some(property_id), Some(_)) => {
            let account = match require_user(&state.accounts, &headers) {
                Ok(account) => account,
                Err(response) => return response,
            };
            let property_id = PropertyId(property_id);
            if let Err(err) = state.portfolio.property_for(account.id, property_id) {
                return portfolio_error_response(err);
            }
            Some((account.id, property_id))
        }
        _ => None,
    };

    // Saved criteria for the property stand in when the query names none.
    if let Some((user_id, property_id)) = owner.filter(|_| !params.has_criteria()) {
        match state.portfolio.latest_criteria(user_id, property_id) {
            Ok(Some(saved)) => match SimilarityCriteria::parse(saved.specs()) {
                Ok(criteria) => request.criteria = criteria,
                Err(err) => return AppError::from(AnalysisError::from(err)).into_response(),
            },
            Ok(None) => {}
            Err(err) => return portfolio_error_response(err),
        }
    }

    let sourced = match state.sources.collect(&request.query) {
        Ok(sourced) => sourced,
        Err(err) => return AppError::from(err).into_response(),
    };

    let analysis = CompetitionAnalysis::run(&sourced.records, &request.criteria, &request.window);
    let draft = owner.map(|_| {
        AnalysisDraft::from_analysis(
            &analysis,
            sourced.records.len(),
            request.query.date,
            request.window,
            request.criteria.specs().clone(),
            sourced.data_source,
        )
    });

    let mut response =
        InspectionsResponse::build(request, sourced.records, sourced.data_source, analysis);

    if let (Some((user_id, property_id)), Some(draft)) = (owner, draft) {
        match save_analysis(&state, user_id, property_id, draft) {
            Ok(analysis_id) => {
                response.analysis_id = Some(analysis_id);
                response.saved_to_database = true;
            }
            Err(err_response) => return err_response,
        }
    }

    (StatusCode::OK, Json(response)).into_response()
}

fn save_analysis(
    state: &AppState,
    user_id: UserId,
    property_id: PropertyId,
    draft: AnalysisDraft,
) -> Result<AnalysisId, Response> {
    state
        .portfolio
        .record_analysis(user_id, property_id, draft, Utc::now())
        .map(|record| record.id)
        .map_err(portfolio_error_response)
}

pub(crate) async fn mock_data_endpoint(
    Extension(state): Extension<AppState>,
    Query(params): Query<InspectionParams>,
) -> Result<Json<InspectionsResponse>, AppError> {
    let today = Local::now().date_naive();
    let request = AnalysisRequest::from_params(&params, Some(MOCK_ADDRESS), Some(today))?;

    let sourced = state.sources.mock_only(&request.query)?;
    let analysis = CompetitionAnalysis::run(&sourced.records, &request.criteria, &request.window);

    let mut response =
        InspectionsResponse::build(request, sourced.records, sourced.data_source, analysis);
    response.is_mock_data = true;
    Ok(Json(response))
}

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use scout_domain::sort::SortKey;
use scout_service::{
	AdminStats, CacheClearReport, Error as ServiceError, FeatureSummary, FilterCriteria,
	SearchRequest, SearchResponse, SessionResultItem, SessionView,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/search", post(search))
		.route("/api/v1/search/session/{session_id}", get(paginate_session))
		.route("/api/v1/search/session/{session_id}/filtered", get(paginate_filtered))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/api/v1/admin/stats", get(admin_stats))
		.route("/api/v1/admin/features", get(admin_features))
		.route("/api/v1/admin/cache/clear", post(admin_cache_clear))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginateParams {
	#[serde(default)]
	page: Option<u32>,
	#[serde(default)]
	page_size: Option<u32>,
	#[serde(default)]
	sort_by: Option<String>,
}

/// Multi-select filters arrive comma-separated, e.g.
/// `?audience=small,large&engagement=high`. The `activity` filter selects on
/// upload consistency (the stored `activity_consistency` score); the
/// `sortBy=ACTIVITY` key orders by most recent upload instead. The
/// `platform` filter is accepted for forward compatibility and passes every
/// row in v1.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilteredParams {
	#[serde(default)]
	page: Option<u32>,
	#[serde(default)]
	page_size: Option<u32>,
	#[serde(default)]
	sort_by: Option<String>,
	#[serde(default)]
	audience: Option<String>,
	#[serde(default)]
	engagement: Option<String>,
	#[serde(default)]
	competitiveness: Option<String>,
	#[serde(default)]
	activity: Option<String>,
	#[serde(default)]
	platform: Option<String>,
	#[serde(default)]
	genres: Option<String>,
}

/// Session page envelope. Unknown and expired sessions are empty shapes,
/// not errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionPageResponse {
	session_id: Option<Uuid>,
	expired: bool,
	query: Option<String>,
	results: Vec<SessionResultItem>,
	total_results: i64,
	total_pages: i64,
	current_page: u32,
	page_size: u32,
	sort_key: String,
	active_filters: usize,
	from_cache: bool,
	external_units_used: i64,
}
impl SessionPageResponse {
	fn from_view(view: SessionView, page: u32, page_size: u32, sort_key: SortKey) -> Self {
		match view {
			SessionView::Missing => Self::empty(None, false, page, page_size, sort_key),
			SessionView::Expired { session_id } =>
				Self::empty(Some(session_id), true, page, page_size, sort_key),
			SessionView::Page(page) => Self {
				session_id: Some(page.session_id),
				expired: false,
				query: Some(page.query),
				results: page.results,
				total_results: page.total_results,
				total_pages: page.total_pages,
				current_page: page.current_page,
				page_size: page.page_size,
				sort_key: page.sort_key,
				active_filters: page.active_filters,
				from_cache: true,
				external_units_used: 0,
			},
		}
	}

	fn empty(
		session_id: Option<Uuid>,
		expired: bool,
		page: u32,
		page_size: u32,
		sort_key: SortKey,
	) -> Self {
		Self {
			session_id,
			expired,
			query: None,
			results: Vec::new(),
			total_results: 0,
			total_pages: 0,
			current_page: page,
			page_size,
			sort_key: sort_key.as_str().to_string(),
			active_filters: 0,
			from_cache: false,
			external_units_used: 0,
		}
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.perform_search(payload).await?;

	Ok(Json(response))
}

async fn paginate_session(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
	Query(params): Query<PaginateParams>,
) -> Result<Json<SessionPageResponse>, ApiError> {
	let page = params.page.unwrap_or(0);
	let page_size = params.page_size.unwrap_or(10);
	let sort_key = SortKey::parse(params.sort_by.as_deref().unwrap_or(""));
	let view = state.service.paginate(session_id, page, page_size, sort_key).await?;

	Ok(Json(SessionPageResponse::from_view(view, page, page_size, sort_key)))
}

async fn paginate_filtered(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
	Query(params): Query<FilteredParams>,
) -> Result<Json<SessionPageResponse>, ApiError> {
	let page = params.page.unwrap_or(0);
	let page_size = params.page_size.unwrap_or(10);
	let sort_key = SortKey::parse(params.sort_by.as_deref().unwrap_or(""));
	let filters = FilterCriteria {
		audience: parse_comma_separated(params.audience.as_deref()),
		engagement: parse_comma_separated(params.engagement.as_deref()),
		competitiveness: parse_comma_separated(params.competitiveness.as_deref()),
		activity: parse_comma_separated(params.activity.as_deref()),
		platform: parse_comma_separated(params.platform.as_deref()),
		genres: parse_comma_separated(params.genres.as_deref()),
	};
	let view =
		state.service.paginate_filtered(session_id, page, page_size, sort_key, &filters).await?;

	Ok(Json(SessionPageResponse::from_view(view, page, page_size, sort_key)))
}

async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
	let stats = state.service.admin_stats().await?;

	Ok(Json(stats))
}

async fn admin_features(State(state): State<AppState>) -> Json<FeatureSummary> {
	Json(state.service.feature_summary())
}

async fn admin_cache_clear(
	State(state): State<AppState>,
) -> Result<Json<CacheClearReport>, ApiError> {
	let report = state.service.clear_caches().await?;

	Ok(Json(report))
}

fn parse_comma_separated(raw: Option<&str>) -> Vec<String> {
	let Some(raw) = raw else {
		return Vec::new();
	};

	raw.split(',')
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty())
		.collect()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

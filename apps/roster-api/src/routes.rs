use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;
use serde_json::Value;

use roster_domain::paging::{Page, Pagination};
use roster_service::{
	AutocompleteRequest, DistributionRequest, Error as ServiceError, MemberSkillsRequest,
	SearchBySkillsRequest, SearchMembersRequest, SkillOperator, StatsRequest,
	skills_search::SkillIds,
};

use crate::{caller::MaybeCaller, state::AppState};

pub const TOTAL_HEADER: &str = "x-total";
pub const PAGE_HEADER: &str = "x-page";
pub const PER_PAGE_HEADER: &str = "x-per-page";
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/members", get(search_members))
		.route("/members/autocomplete", get(autocomplete))
		.route("/members/search/skills", get(search_members_by_skills))
		.route("/members/stats/distribution", get(distribution))
		.route("/members/{handle}/stats", get(member_stats))
		.route("/members/{handle}/stats/history", get(history_stats))
		.route("/members/{handle}/skills", get(member_skills).patch(update_member_skills))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_members(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Query(query): Query<SearchMembersRequest>,
) -> Result<Response, ApiError> {
	let page = state.service.search_members(caller.caller(), query).await?;

	Ok(paged_array(page))
}

async fn autocomplete(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Query(query): Query<AutocompleteRequest>,
) -> Result<Response, ApiError> {
	let page = state.service.autocomplete(caller.caller(), query).await?;

	Ok(paged_array(page))
}

/// Skills search answers with the page envelope rather than pagination headers.
async fn search_members_by_skills(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
	let query = skills_query(params)?;
	let page = state.service.search_members_by_skills(caller.caller(), query).await?;

	Ok(Json(page).into_response())
}

async fn distribution(
	State(state): State<AppState>,
	Query(query): Query<DistributionRequest>,
) -> Result<Response, ApiError> {
	let summary = state.service.get_distribution(query).await?;

	Ok(Json(summary).into_response())
}

async fn member_stats(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Path(handle): Path<String>,
	Query(query): Query<StatsRequest>,
) -> Result<Response, ApiError> {
	let records = state.service.get_member_stats(caller.caller(), &handle, query).await?;

	Ok(Json(records).into_response())
}

async fn history_stats(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Path(handle): Path<String>,
	Query(query): Query<StatsRequest>,
) -> Result<Response, ApiError> {
	let records = state.service.get_history_stats(caller.caller(), &handle, query).await?;

	Ok(Json(records).into_response())
}

async fn member_skills(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Path(handle): Path<String>,
	Query(query): Query<MemberSkillsRequest>,
) -> Result<Response, ApiError> {
	let view = state.service.get_member_skills(caller.caller(), &handle, query).await?;

	Ok(Json(view).into_response())
}

async fn update_member_skills(
	State(state): State<AppState>,
	caller: MaybeCaller,
	Path(handle): Path<String>,
	Json(body): Json<Value>,
) -> Result<Response, ApiError> {
	let view = state.service.update_member_skills_partial(caller.caller(), &handle, body).await?;

	Ok(Json(view).into_response())
}

/// Collects repeated `skillId` parameters; every other parameter keeps its last value.
fn skills_query(params: Vec<(String, String)>) -> Result<SearchBySkillsRequest, ApiError> {
	let mut skill_ids = Vec::new();
	let mut query = SearchBySkillsRequest::default();

	for (name, value) in params {
		match name.as_str() {
			"skillId" => skill_ids.push(value),
			"operator" => query.operator = parse_operator(&value)?,
			"fields" => query.fields = Some(value),
			"sortBy" => query.sort_by = Some(value),
			"sortOrder" => query.sort_order = Some(value),
			"page" => query.page = Some(parse_count("page", &value)?),
			"perPage" => query.per_page = Some(parse_count("perPage", &value)?),
			_ => {},
		}
	}

	if !skill_ids.is_empty() {
		query.skill_id = Some(SkillIds::Many(skill_ids));
	}

	Ok(query)
}

fn parse_operator(raw: &str) -> Result<SkillOperator, ApiError> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"and" => Ok(SkillOperator::And),
		"or" => Ok(SkillOperator::Or),
		_ => Err(json_error(StatusCode::BAD_REQUEST, "bad_request", "operator must be and or or.")),
	}
}

fn parse_count(name: &str, raw: &str) -> Result<u32, ApiError> {
	raw.trim().parse::<u32>().map_err(|_| {
		json_error(
			StatusCode::BAD_REQUEST,
			"bad_request",
			format!("{name} must be a non-negative integer."),
		)
	})
}

fn paged_array<T>(page: Page<T>) -> Response
where
	T: Serialize,
{
	let pagination = Pagination { page: page.page, per_page: page.per_page };
	let total_pages = pagination.total_pages(page.total);
	let mut headers = HeaderMap::new();

	for (name, value) in [
		(TOTAL_HEADER, page.total),
		(PAGE_HEADER, u64::from(page.page)),
		(PER_PAGE_HEADER, u64::from(page.per_page)),
		(TOTAL_PAGES_HEADER, total_pages),
	] {
		headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
	}

	(headers, Json(page.result)).into_response()
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
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::UNAUTHORIZED, "unauthorized", message),
			ServiceError::BadRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "bad_request", message),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "forbidden", message),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::DataFormat { message } =>
				json_error(StatusCode::UNPROCESSABLE_ENTITY, "data_format", message),
			ServiceError::BackendUnavailable { message } => {
				tracing::warn!(error = %message, "Backend call failed.");

				json_error(StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable", message)
			},
			ServiceError::InvalidConfig { message } => {
				tracing::error!(error = %message, "Service misconfigured.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid_config", message)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

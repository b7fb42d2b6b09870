//! Caller identity as forwarded by the authenticating gateway.

use axum::{
	extract::FromRequestParts,
	http::{HeaderMap, StatusCode, request::Parts},
};

use roster_domain::identity::Caller;

use crate::routes::{ApiError, json_error};

pub const USER_ID_HEADER: &str = "x-caller-user-id";
pub const HANDLE_HEADER: &str = "x-caller-handle";
pub const ROLES_HEADER: &str = "x-caller-roles";
pub const MACHINE_HEADER: &str = "x-caller-machine";

/// The request's caller, `None` when no identity header is present.
#[derive(Clone, Debug, Default)]
pub struct MaybeCaller(pub Option<Caller>);
impl MaybeCaller {
	pub fn caller(&self) -> Option<&Caller> {
		self.0.as_ref()
	}
}

impl<S> FromRequestParts<S> for MaybeCaller
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		caller_from_headers(&parts.headers).map(Self)
	}
}

pub fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, ApiError> {
	let user_id = header_text(headers, USER_ID_HEADER)?
		.map(|raw| {
			raw.parse::<i64>().map_err(|_| {
				json_error(
					StatusCode::BAD_REQUEST,
					"bad_request",
					format!("{USER_ID_HEADER} must be an integer."),
				)
			})
		})
		.transpose()?;
	let handle = header_text(headers, HANDLE_HEADER)?;
	let roles = header_text(headers, ROLES_HEADER)?
		.map(|raw| {
			raw.split(',')
				.map(str::trim)
				.filter(|role| !role.is_empty())
				.map(str::to_string)
				.collect::<Vec<_>>()
		})
		.unwrap_or_default();
	let is_machine = match header_text(headers, MACHINE_HEADER)?.as_deref() {
		None => false,
		Some(raw) if raw.eq_ignore_ascii_case("true") => true,
		Some(raw) if raw.eq_ignore_ascii_case("false") => false,
		Some(_) =>
			return Err(json_error(
				StatusCode::BAD_REQUEST,
				"bad_request",
				format!("{MACHINE_HEADER} must be true or false."),
			)),
	};

	if user_id.is_none() && handle.is_none() && !is_machine {
		if !roles.is_empty() {
			return Err(json_error(
				StatusCode::BAD_REQUEST,
				"bad_request",
				format!("{ROLES_HEADER} requires a caller identity."),
			));
		}

		return Ok(None);
	}

	Ok(Some(Caller { user_id, handle, roles, is_machine }))
}

fn header_text(headers: &HeaderMap, name: &str) -> Result<Option<String>, ApiError> {
	let Some(value) = headers.get(name) else {
		return Ok(None);
	};
	let text = value.to_str().map_err(|_| {
		json_error(StatusCode::BAD_REQUEST, "bad_request", format!("{name} must be visible ASCII."))
	})?;
	let text = text.trim();

	Ok((!text.is_empty()).then(|| text.to_string()))
}

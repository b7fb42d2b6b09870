use serde::{Deserialize, Serialize};

use roster_config::Roles;

/// Authenticated principal behind a request. Anonymous requests carry no `Caller` at all.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
	pub user_id: Option<i64>,
	pub handle: Option<String>,
	#[serde(default)]
	pub roles: Vec<String>,
	#[serde(default)]
	pub is_machine: bool,
}
impl Caller {
	pub fn machine() -> Self {
		Self { is_machine: true, ..Default::default() }
	}

	pub fn member(user_id: i64, handle: impl Into<String>, roles: &[&str]) -> Self {
		Self {
			user_id: Some(user_id),
			handle: Some(handle.into()),
			roles: roles.iter().map(|role| role.to_string()).collect(),
			is_machine: false,
		}
	}

	/// Name recorded in audit fields for writes made by this caller.
	pub fn audit_name(&self) -> String {
		match (&self.handle, self.user_id) {
			(Some(handle), _) => handle.clone(),
			(None, Some(user_id)) => user_id.to_string(),
			(None, None) if self.is_machine => "machine".to_string(),
			(None, None) => "unknown".to_string(),
		}
	}

	pub fn is_member(&self, user_id: Option<i64>, handle_lower: Option<&str>) -> bool {
		if let (Some(own), Some(target)) = (self.user_id, user_id)
			&& own == target
		{
			return true;
		}

		match (self.handle.as_deref(), handle_lower) {
			(Some(own), Some(target)) => own.to_lowercase() == target,
			_ => false,
		}
	}
}

/// Capability predicates evaluated against the configured role names.
#[derive(Clone, Debug)]
pub struct RolePolicy {
	admin: Vec<String>,
	autocomplete: Vec<String>,
	search_by_email: Vec<String>,
}
impl RolePolicy {
	pub fn from_config(roles: &Roles) -> Self {
		Self {
			admin: normalize_roles(&roles.admin),
			autocomplete: normalize_roles(&roles.autocomplete),
			search_by_email: normalize_roles(&roles.search_by_email),
		}
	}

	pub fn has_admin_role(&self, caller: &Caller) -> bool {
		holds_any(caller, &self.admin)
	}

	pub fn has_autocomplete_role(&self, caller: &Caller) -> bool {
		holds_any(caller, &self.autocomplete)
	}

	pub fn has_search_by_email_role(&self, caller: &Caller) -> bool {
		holds_any(caller, &self.search_by_email)
	}

	/// Machine principals and admins may read and write any member.
	pub fn can_manage_members(&self, caller: Option<&Caller>) -> bool {
		caller.map(|caller| caller.is_machine || self.has_admin_role(caller)).unwrap_or(false)
	}

	pub fn can_manage_member(
		&self,
		caller: Option<&Caller>,
		user_id: Option<i64>,
		handle_lower: Option<&str>,
	) -> bool {
		self.can_manage_members(caller)
			|| caller.map(|caller| caller.is_member(user_id, handle_lower)).unwrap_or(false)
	}
}

fn normalize_roles(roles: &[String]) -> Vec<String> {
	roles.iter().map(|role| role.trim().to_lowercase()).collect()
}

fn holds_any(caller: &Caller, roles: &[String]) -> bool {
	caller.roles.iter().any(|held| {
		let held = held.trim().to_lowercase();

		roles.iter().any(|role| *role == held)
	})
}

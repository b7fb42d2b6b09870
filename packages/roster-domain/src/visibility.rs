//! Caller-dependent trimming of the output field set.

use roster_config::{Fields, Roles};

use crate::{
	Error, Result,
	fields::{FieldRegistry, FieldSet, MemberField},
	identity::{Caller, RolePolicy},
};

#[derive(Clone, Debug)]
pub struct VisibilityPolicy {
	secure: Vec<&'static str>,
	communication: Vec<&'static str>,
	roles: RolePolicy,
}
impl VisibilityPolicy {
	pub fn from_config(fields: &Fields, roles: &Roles) -> Result<Self> {
		Ok(Self {
			secure: member_field_names("fields.secure", &fields.secure)?,
			communication: member_field_names("fields.communication", &fields.communication)?,
			roles: RolePolicy::from_config(roles),
		})
	}

	pub fn roles(&self) -> &RolePolicy {
		&self.roles
	}

	/// Parses `requested` against `F` and removes what the caller may not see. Applying the
	/// result as a new request for the same caller yields the same set.
	pub fn resolve<F>(&self, caller: Option<&Caller>, requested: Option<&str>) -> FieldSet<F>
	where
		F: FieldRegistry,
	{
		let mut allowed = FieldSet::<F>::parse_requested(requested);
		let is_machine = caller.map(|caller| caller.is_machine).unwrap_or(false);
		let is_admin = caller.map(|caller| self.roles.has_admin_role(caller)).unwrap_or(false);
		let is_autocomplete =
			caller.map(|caller| self.roles.has_autocomplete_role(caller)).unwrap_or(false);

		if !(is_machine || is_admin) {
			allowed = allowed.without_names(&self.secure);
		}
		if !(is_machine || is_autocomplete) {
			allowed = allowed.without_names(&self.communication);
		}

		allowed
	}
}

fn member_field_names(setting: &str, names: &[String]) -> Result<Vec<&'static str>> {
	names
		.iter()
		.map(|name| {
			MemberField::parse(name).map(MemberField::name).ok_or_else(|| Error::UnknownField {
				setting: setting.to_string(),
				name: name.clone(),
			})
		})
		.collect()
}

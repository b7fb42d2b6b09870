use roster_domain::models::{self, MemberProfile};

use crate::{Error, Lookup, Result, RosterService};

impl RosterService {
	/// Loads one member by handle. Absence surfaces as `NotFound`.
	pub async fn member_by_handle(&self, handle: &str) -> Result<MemberProfile> {
		let handle_lower = handle.trim().to_lowercase();

		if handle_lower.is_empty() {
			return Err(Error::BadRequest { message: "handle must be non-empty.".to_string() });
		}

		match self.backends.store.get_by_key(&self.tables().members, &handle_lower).await {
			Lookup::Found(doc) => Ok(models::decode("member", doc)?),
			Lookup::NotFound =>
				Err(Error::NotFound { message: format!("Member with handle {handle:?} does not exist.") }),
			Lookup::Failure(err) => Err(err),
		}
	}
}

/// Requires a user id on a member record used as a lookup key.
pub(crate) fn member_user_id(member: &MemberProfile) -> Result<i64> {
	member.user_id.ok_or_else(|| Error::DataFormat {
		message: "Member record has no userId.".to_string(),
	})
}

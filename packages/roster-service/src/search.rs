use serde::Deserialize;

use roster_domain::{
	fields::{self, AutocompleteField, FieldSet},
	identity::Caller,
	models::{self, MemberProfile},
	paging::{Page, Pagination},
	sort::{self, MemberSortKey, SortOrder},
};

use crate::{Error, ProfileQuery, Result, RosterService, merge::FillPlan};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMembersRequest {
	/// Comma-separated handles.
	pub handle: Option<String>,
	/// Comma-separated user ids.
	pub user_id: Option<String>,
	pub email: Option<String>,
	pub term: Option<String>,
	pub fields: Option<String>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
	pub page: Option<u32>,
	pub per_page: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteRequest {
	pub term: Option<String>,
	pub fields: Option<String>,
	pub page: Option<u32>,
	pub per_page: Option<u32>,
}

impl RosterService {
	pub async fn search_members(
		&self,
		caller: Option<&Caller>,
		req: SearchMembersRequest,
	) -> Result<Page<MemberProfile>> {
		let email = non_blank(req.email.as_deref());

		if email.is_some() {
			self.authorize_email_search(caller)?;
		}

		let pagination =
			Pagination::new(req.page, req.per_page, self.cfg.search.max_per_page)?;
		let plan = FillPlan {
			sort_by: MemberSortKey::parse(req.sort_by.as_deref())?,
			sort_order: SortOrder::parse(req.sort_order.as_deref())?,
			fields: self.visibility.resolve(caller, req.fields.as_deref()),
			pagination,
		};
		let query = ProfileQuery {
			handles_lower: split_list(req.handle.as_deref())
				.into_iter()
				.map(|handle| handle.to_lowercase())
				.collect(),
			user_ids: parse_user_ids(req.user_id.as_deref())?,
			email,
			term: non_blank(req.term.as_deref()),
			handle_prefix: None,
		};
		let hits = self.backends.profiles.query(&query).await?;
		let mut page = self.fill_members(hits, &plan).await?;

		if !self.visibility.roles().can_manage_members(caller) {
			for member in page.result.iter_mut() {
				member.redact_private_details();
			}
		}

		Ok(page)
	}

	/// Handle-prefix lookup for signed-in callers. No merge and no verification.
	pub async fn autocomplete(
		&self,
		caller: Option<&Caller>,
		req: AutocompleteRequest,
	) -> Result<Page<MemberProfile>> {
		if caller.is_none() {
			return Err(Error::Unauthorized {
				message: "Autocomplete requires an authenticated caller.".to_string(),
			});
		}

		let Some(term) = non_blank(req.term.as_deref()) else {
			return Err(Error::BadRequest { message: "term is required.".to_string() });
		};
		let pagination =
			Pagination::new(req.page, req.per_page, self.cfg.search.max_per_page)?;
		let allowed: FieldSet<AutocompleteField> =
			self.visibility.resolve(caller, req.fields.as_deref());
		let fields = FieldSet::from_fields(allowed.iter().map(AutocompleteField::member_field));
		let query = ProfileQuery { handle_prefix: Some(term.to_lowercase()), ..Default::default() };
		let hits = self.backends.profiles.query(&query).await?;
		let mut members = hits
			.docs
			.into_iter()
			.filter_map(|doc| match models::decode::<MemberProfile>("member", doc) {
				Ok(member) => Some(member),
				Err(err) => {
					tracing::warn!(error = %err, "Skipping undecodable profile.");

					None
				},
			})
			.collect::<Vec<_>>();

		sort::sort_members(&mut members, MemberSortKey::HandleLower, SortOrder::Asc);

		let members =
			members.into_iter().map(|member| fields::project(member, &fields)).collect::<Vec<_>>();

		Ok(Page::from_window(hits.total, members, pagination))
	}

	fn authorize_email_search(&self, caller: Option<&Caller>) -> Result<()> {
		let Some(caller) = caller else {
			return Err(Error::Unauthorized {
				message: "Searching by email requires an authenticated caller.".to_string(),
			});
		};

		if !self.visibility.roles().has_search_by_email_role(caller) {
			return Err(Error::BadRequest {
				message: "Caller is not allowed to search by email.".to_string(),
			});
		}

		Ok(())
	}
}

pub(crate) fn non_blank(raw: Option<&str>) -> Option<String> {
	raw.map(str::trim).filter(|raw| !raw.is_empty()).map(str::to_string)
}

pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
	raw.map(|raw| {
		raw.split(',')
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(str::to_string)
			.collect()
	})
	.unwrap_or_default()
}

fn parse_user_ids(raw: Option<&str>) -> Result<Vec<i64>> {
	split_list(raw)
		.into_iter()
		.map(|item| {
			item.parse::<i64>().map_err(|_| Error::BadRequest {
				message: format!("userId {item:?} is not an integer."),
			})
		})
		.collect()
}

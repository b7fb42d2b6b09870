use serde::Deserialize;

use roster_domain::{
	identity::Caller,
	models::{MemberProfile, MemberSkillsRecord},
	paging::{Page, Pagination},
	sort::{MemberSortKey, SortOrder},
};

use crate::{
	ProfileQuery, Result, RosterService,
	merge::{self, FillPlan},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillOperator {
	#[default]
	And,
	Or,
}

/// One skill id or a list of them.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SkillIds {
	One(String),
	Many(Vec<String>),
}
impl SkillIds {
	pub fn into_list(self) -> Vec<String> {
		let raw = match self {
			Self::One(one) => vec![one],
			Self::Many(many) => many,
		};
		let mut ids = Vec::with_capacity(raw.len());

		for id in raw.iter().flat_map(|item| item.split(',')).map(str::trim) {
			if !id.is_empty() && !ids.iter().any(|seen: &String| seen == id) {
				ids.push(id.to_string());
			}
		}

		ids
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBySkillsRequest {
	pub skill_id: Option<SkillIds>,
	#[serde(default)]
	pub operator: SkillOperator,
	pub fields: Option<String>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
	pub page: Option<u32>,
	pub per_page: Option<u32>,
}

impl RosterService {
	/// Members holding the requested skills, merged like a plain search and ordered only by the
	/// requested sort with the `handleLower` tiebreak.
	pub async fn search_members_by_skills(
		&self,
		caller: Option<&Caller>,
		req: SearchBySkillsRequest,
	) -> Result<Page<MemberProfile>> {
		let skill_ids = req.skill_id.map(SkillIds::into_list).unwrap_or_default();
		let pagination = Pagination::new(req.page, req.per_page, self.cfg.search.max_per_page)?;

		if skill_ids.is_empty() {
			return Ok(Page::empty(pagination));
		}

		let plan = FillPlan {
			sort_by: MemberSortKey::parse(req.sort_by.as_deref())?,
			sort_order: SortOrder::parse(req.sort_order.as_deref())?,
			fields: self.visibility.resolve(caller, req.fields.as_deref()),
			pagination,
		};
		let skill_docs =
			self.backends.skills.query_by_skill_ids(&skill_ids, req.operator).await?;
		let skill_docs = merge::decode_all::<MemberSkillsRecord>("skills", skill_docs)?;
		let mut user_ids = Vec::with_capacity(skill_docs.len());

		for user_id in skill_docs.iter().filter_map(|doc| doc.user_id) {
			if !user_ids.contains(&user_id) {
				user_ids.push(user_id);
			}
		}

		if user_ids.is_empty() {
			return Ok(Page::empty(pagination));
		}

		let query = ProfileQuery { user_ids, ..Default::default() };
		let hits = self.backends.profiles.query(&query).await?;

		self.fill_members(hits, &plan).await
	}
}

#[cfg(test)]
mod tests {
	use crate::skills_search::SkillIds;

	#[test]
	fn skill_ids_normalize_to_a_unique_list() {
		assert_eq!(SkillIds::One("7".to_string()).into_list(), vec!["7"]);
		assert_eq!(
			SkillIds::Many(vec!["7,8".to_string(), " 8 ".to_string(), "".to_string()]).into_list(),
			vec!["7", "8"]
		);
	}
}

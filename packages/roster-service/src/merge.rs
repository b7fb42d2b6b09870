//! Joins profile, skill and statistics documents into merged member records.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use roster_domain::{
	fields::{self, FieldSet, MemberField, StatsField},
	models::{self, MemberProfile, MemberSkillsRecord, StatsRecord},
	paging::{Page, Pagination},
	rating::RatingPalette,
	skills::SkillMap,
	sort::{self, MemberSortKey, SortOrder},
};

use crate::{ProfileHits, Result, RosterService};

/// How a merged window is ordered, trimmed and sliced.
#[derive(Clone, Debug)]
pub struct FillPlan {
	pub sort_by: MemberSortKey,
	pub sort_order: SortOrder,
	pub fields: FieldSet<MemberField>,
	pub pagination: Pagination,
}

impl RosterService {
	/// Merges profile hits with skills and statistics, then sorts, verifies, projects and
	/// paginates. `total` is taken from the hits and never changed by pagination.
	pub async fn fill_members(&self, hits: ProfileHits, plan: &FillPlan) -> Result<Page<MemberProfile>> {
		if hits.total == 0 || hits.docs.is_empty() {
			return Ok(Page::from_window(hits.total, Vec::new(), plan.pagination));
		}

		let profiles = decode_profiles(hits.docs);
		let handles = profiles.iter().filter_map(MemberProfile::lower_handle).collect::<Vec<_>>();
		let (skill_docs, stats_docs) = tokio::try_join!(
			self.backends.skills.query_by_handles(&handles),
			self.backends.stats.query_by_handles(&handles),
		)?;
		let skill_docs = decode_all::<MemberSkillsRecord>("skills", skill_docs)?;
		let stats_docs = decode_all::<StatsRecord>("stats", stats_docs)?;
		let mut members = merge_members(profiles, skill_docs, stats_docs, &self.palette)?;

		sort::sort_members(&mut members, plan.sort_by, plan.sort_order);

		let members = self.annotate_verified(members).await?;
		let members = members
			.into_iter()
			.map(|member| fields::project(member, &plan.fields))
			.collect::<Vec<_>>();

		Ok(Page::from_window(hits.total, members, plan.pagination))
	}
}

/// Left-joins skills then statistics onto profiles by `userId`.
pub fn merge_members(
	profiles: Vec<MemberProfile>,
	skill_docs: Vec<MemberSkillsRecord>,
	stats_docs: Vec<StatsRecord>,
	palette: &RatingPalette,
) -> Result<Vec<MemberProfile>> {
	let mut skills_by_user = HashMap::<i64, SkillMap>::new();

	for doc in skill_docs {
		let Some(user_id) = doc.user_id else {
			continue;
		};

		if !skills_by_user.contains_key(&user_id) {
			skills_by_user.insert(user_id, doc.skill_map()?);
		}
	}

	let mut stats_by_user = HashMap::<i64, StatsRecord>::new();

	for doc in stats_docs {
		if let Some(user_id) = doc.user_id {
			stats_by_user.entry(user_id).or_insert(doc);
		}
	}

	let stats_fields = StatsField::search_set();
	let mut merged = Vec::with_capacity(profiles.len());

	for mut member in profiles {
		let Some(user_id) = member.user_id else {
			continue;
		};

		member.skills = Some(skills_by_user.remove(&user_id).unwrap_or_default());

		let mut won = member.number_of_challenges_won.unwrap_or(0);
		let mut placed = member.number_of_challenges_placed.unwrap_or(0);

		match stats_by_user.remove(&user_id) {
			Some(mut record) => {
				if let Some(mut max_rating) = record.max_rating.clone() {
					if let Some(rating) = max_rating.rating {
						max_rating.rating_color = Some(palette.color_for(rating).to_string());
					}

					record.max_rating = Some(max_rating.clone());
					member.max_rating = Some(max_rating);
				}

				won = won.max(record.wins.unwrap_or(0));

				if let Some(challenges) = record.challenges {
					placed = challenges;
				}

				member.stats = Some(vec![fields::project(record, &stats_fields)]);
			},
			None => member.stats = Some(Vec::new()),
		}

		member.number_of_challenges_won = Some(won);
		member.number_of_challenges_placed = Some(placed);

		merged.push(member);
	}

	Ok(merged)
}

/// Decodes profile documents, keeping the first record per `userId` and dropping records that
/// cannot be decoded or joined.
fn decode_profiles(docs: Vec<Value>) -> Vec<MemberProfile> {
	let mut seen = HashSet::new();
	let mut profiles = Vec::with_capacity(docs.len());

	for doc in docs {
		let mut profile: MemberProfile = match models::decode("member", doc) {
			Ok(profile) => profile,
			Err(err) => {
				tracing::warn!(error = %err, "Skipping undecodable profile.");

				continue;
			},
		};
		let Some(user_id) = profile.user_id else {
			tracing::debug!(handle = ?profile.handle, "Skipping profile without userId.");

			continue;
		};

		if !seen.insert(user_id) {
			continue;
		}
		if profile.handle_lower.is_none() {
			profile.handle_lower = profile.lower_handle();
		}

		profiles.push(profile);
	}

	profiles
}

pub(crate) fn decode_all<T>(entity: &str, docs: Vec<Value>) -> Result<Vec<T>>
where
	T: serde::de::DeserializeOwned,
{
	docs.into_iter().map(|doc| Ok(models::decode(entity, doc)?)).collect()
}

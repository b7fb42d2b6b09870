//! Entity shapes read from the indexes and the document store, and the shapes returned to
//! callers. Every field is optional so that projection can drop it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
	Error, Result,
	fields::{
		DistributionField, HistoryStatsField, MemberField, Projectable, SkillsField, StatsField,
	},
	skills::{self, SkillMap},
	sort::{MemberSortKey, SortValue, SortableMember},
};

/// Decodes a raw document into `T`, reporting the entity on failure.
pub fn decode<T>(entity: &str, doc: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_json::from_value(doc)
		.map_err(|err| Error::DataFormat { message: format!("{entity} document: {err}") })
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle_lower: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub addresses: Option<Vec<Address>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub home_country_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub competition_country_code: Option<String>,
	#[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
	pub photo_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tracks: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_rating: Option<MaxRating>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skills: Option<SkillMap>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stats: Option<Vec<StatsRecord>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub emsi_skills: Option<Vec<Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub verified: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub number_of_challenges_won: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub number_of_challenges_placed: Option<u64>,
}
impl MemberProfile {
	/// Lowercased handle, derived from `handle` when the document lacks `handleLower`.
	pub fn lower_handle(&self) -> Option<String> {
		self.handle_lower
			.clone()
			.or_else(|| self.handle.as_ref().map(|handle| handle.to_lowercase()))
	}

	/// Strips street lines from addresses and shortens the last name to its initial.
	pub fn redact_private_details(&mut self) {
		if let Some(addresses) = self.addresses.as_mut() {
			for address in addresses.iter_mut() {
				*address = address.secure();
			}
		}
		if let Some(last_name) = self.last_name.as_mut() {
			*last_name = last_name.chars().take(1).collect();
		}
	}
}
impl Projectable for MemberProfile {
	type Field = MemberField;

	fn clear(&mut self, field: MemberField) {
		match field {
			MemberField::UserId => self.user_id = None,
			MemberField::Handle => self.handle = None,
			MemberField::HandleLower => self.handle_lower = None,
			MemberField::FirstName => self.first_name = None,
			MemberField::LastName => self.last_name = None,
			MemberField::Description => self.description = None,
			MemberField::Email => self.email = None,
			MemberField::Addresses => self.addresses = None,
			MemberField::HomeCountryCode => self.home_country_code = None,
			MemberField::CompetitionCountryCode => self.competition_country_code = None,
			MemberField::PhotoUrl => self.photo_url = None,
			MemberField::Tracks => self.tracks = None,
			MemberField::Status => self.status = None,
			MemberField::CreatedAt => self.created_at = None,
			MemberField::CreatedBy => self.created_by = None,
			MemberField::UpdatedAt => self.updated_at = None,
			MemberField::UpdatedBy => self.updated_by = None,
			MemberField::MaxRating => self.max_rating = None,
			MemberField::Skills => self.skills = None,
			MemberField::Stats => self.stats = None,
			MemberField::EmsiSkills => self.emsi_skills = None,
			MemberField::Verified => self.verified = None,
			MemberField::NumberOfChallengesWon => self.number_of_challenges_won = None,
			MemberField::NumberOfChallengesPlaced => self.number_of_challenges_placed = None,
		}
	}
}
impl SortableMember for MemberProfile {
	fn sort_value(&self, key: MemberSortKey) -> SortValue {
		let text = |value: &Option<String>| {
			value.as_ref().map(|value| SortValue::Text(value.clone())).unwrap_or(SortValue::Missing)
		};
		let count = |value: Option<u64>| {
			value
				.map(|value| SortValue::Int(i64::try_from(value).unwrap_or(i64::MAX)))
				.unwrap_or(SortValue::Missing)
		};
		let instant =
			|value: Option<OffsetDateTime>| value.map(SortValue::Time).unwrap_or(SortValue::Missing);

		match key {
			MemberSortKey::UserId => self.user_id.map(SortValue::Int).unwrap_or(SortValue::Missing),
			MemberSortKey::Handle => text(&self.handle),
			MemberSortKey::HandleLower => SortValue::Text(self.handle_lower().to_string()),
			MemberSortKey::FirstName => text(&self.first_name),
			MemberSortKey::LastName => text(&self.last_name),
			MemberSortKey::MaxRating => self
				.max_rating
				.as_ref()
				.and_then(|max_rating| max_rating.rating)
				.map(SortValue::Int)
				.unwrap_or(SortValue::Missing),
			MemberSortKey::NumberOfChallengesWon => count(self.number_of_challenges_won),
			MemberSortKey::NumberOfChallengesPlaced => count(self.number_of_challenges_placed),
			MemberSortKey::CreatedAt => instant(self.created_at),
			MemberSortKey::UpdatedAt => instant(self.updated_at),
		}
	}

	fn handle_lower(&self) -> &str {
		self.handle_lower.as_deref().unwrap_or_default()
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub street_addr1: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub street_addr2: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub zip: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country_code: Option<String>,
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
}
impl Address {
	/// The part of an address any caller may read.
	pub fn secure(&self) -> Self {
		Self {
			street_addr1: None,
			street_addr2: None,
			city: self.city.clone(),
			state_code: self.state_code.clone(),
			zip: self.zip.clone(),
			country_code: self.country_code.clone(),
			kind: self.kind.clone(),
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxRating {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub track: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub_track: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating_color: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle_lower: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_rating: Option<MaxRating>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub challenges: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wins: Option<u64>,
	#[serde(default, rename = "DEVELOP", skip_serializing_if = "Option::is_none")]
	pub develop: Option<Value>,
	#[serde(default, rename = "DESIGN", skip_serializing_if = "Option::is_none")]
	pub design: Option<Value>,
	#[serde(default, rename = "DATA_SCIENCE", skip_serializing_if = "Option::is_none")]
	pub data_science: Option<Value>,
	#[serde(default, rename = "COPILOT", skip_serializing_if = "Option::is_none")]
	pub copilot: Option<Value>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
}
impl StatsRecord {
	/// Track blocks are sometimes stored as JSON text; turn them back into objects.
	pub fn decode_embedded(&mut self) -> Result<()> {
		for (name, slot) in [
			("DEVELOP", &mut self.develop),
			("DESIGN", &mut self.design),
			("DATA_SCIENCE", &mut self.data_science),
			("COPILOT", &mut self.copilot),
		] {
			decode_embedded_value(name, slot)?;
		}

		Ok(())
	}
}
impl Projectable for StatsRecord {
	type Field = StatsField;

	fn clear(&mut self, field: StatsField) {
		match field {
			StatsField::UserId => self.user_id = None,
			StatsField::GroupId => self.group_id = None,
			StatsField::Handle => self.handle = None,
			StatsField::HandleLower => self.handle_lower = None,
			StatsField::MaxRating => self.max_rating = None,
			StatsField::Challenges => self.challenges = None,
			StatsField::Wins => self.wins = None,
			StatsField::Develop => self.develop = None,
			StatsField::Design => self.design = None,
			StatsField::DataScience => self.data_science = None,
			StatsField::Copilot => self.copilot = None,
			StatsField::CreatedAt => self.created_at = None,
			StatsField::CreatedBy => self.created_by = None,
			StatsField::UpdatedAt => self.updated_at = None,
			StatsField::UpdatedBy => self.updated_by = None,
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatsRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle_lower: Option<String>,
	#[serde(default, rename = "DEVELOP", skip_serializing_if = "Option::is_none")]
	pub develop: Option<Value>,
	#[serde(default, rename = "DATA_SCIENCE", skip_serializing_if = "Option::is_none")]
	pub data_science: Option<Value>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
}
impl HistoryStatsRecord {
	pub fn decode_embedded(&mut self) -> Result<()> {
		decode_embedded_value("DEVELOP", &mut self.develop)?;
		decode_embedded_value("DATA_SCIENCE", &mut self.data_science)
	}
}
impl Projectable for HistoryStatsRecord {
	type Field = HistoryStatsField;

	fn clear(&mut self, field: HistoryStatsField) {
		match field {
			HistoryStatsField::UserId => self.user_id = None,
			HistoryStatsField::GroupId => self.group_id = None,
			HistoryStatsField::Handle => self.handle = None,
			HistoryStatsField::HandleLower => self.handle_lower = None,
			HistoryStatsField::Develop => self.develop = None,
			HistoryStatsField::DataScience => self.data_science = None,
			HistoryStatsField::CreatedAt => self.created_at = None,
			HistoryStatsField::CreatedBy => self.created_by = None,
			HistoryStatsField::UpdatedAt => self.updated_at = None,
			HistoryStatsField::UpdatedBy => self.updated_by = None,
		}
	}
}

/// Statistics records whose per-track blocks arrive as embedded JSON strings.
pub trait EmbeddedStats {
	fn decode_embedded_blocks(&mut self) -> Result<()>;
}
impl EmbeddedStats for StatsRecord {
	fn decode_embedded_blocks(&mut self) -> Result<()> {
		self.decode_embedded()
	}
}
impl EmbeddedStats for HistoryStatsRecord {
	fn decode_embedded_blocks(&mut self) -> Result<()> {
		self.decode_embedded()
	}
}

/// One stored rating distribution row.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRecord {
	#[serde(default)]
	pub track: Option<String>,
	#[serde(default)]
	pub sub_track: Option<String>,
	#[serde(default)]
	pub distribution: Option<BTreeMap<String, Value>>,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub created_by: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub updated_by: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub track: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub_track: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distribution: Option<BTreeMap<String, i64>>,
	#[serde(with = "crate::time_serde::option", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(with = "crate::time_serde::option", skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
}
impl DistributionSummary {
	pub fn new(track: Option<String>, sub_track: Option<String>) -> Self {
		Self { track, sub_track, distribution: Some(BTreeMap::new()), ..Default::default() }
	}

	/// Adds one record's buckets and widens the provenance window.
	pub fn accumulate(&mut self, record: &DistributionRecord) -> Result<()> {
		let totals = self.distribution.get_or_insert_with(BTreeMap::new);

		for (bucket, value) in record.distribution.iter().flatten() {
			let count = bucket_count(bucket, value)?;
			let total = totals.entry(bucket.clone()).or_insert(0);

			*total = total.saturating_add(count);
		}

		if let Some(created_at) = record.created_at
			&& self.created_at.map(|current| created_at < current).unwrap_or(true)
		{
			self.created_at = Some(created_at);
			self.created_by = record.created_by.clone();
		}
		if let Some(updated_at) = record.updated_at
			&& self.updated_at.map(|current| updated_at > current).unwrap_or(true)
		{
			self.updated_at = Some(updated_at);
			self.updated_by = record.updated_by.clone();
		}

		Ok(())
	}
}
impl Projectable for DistributionSummary {
	type Field = DistributionField;

	fn clear(&mut self, field: DistributionField) {
		match field {
			DistributionField::Track => self.track = None,
			DistributionField::SubTrack => self.sub_track = None,
			DistributionField::Distribution => self.distribution = None,
			DistributionField::CreatedAt => self.created_at = None,
			DistributionField::CreatedBy => self.created_by = None,
			DistributionField::UpdatedAt => self.updated_at = None,
			DistributionField::UpdatedBy => self.updated_by = None,
		}
	}
}

/// A stored skills row, either entered or aggregated. Skill-index documents share the shape.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSkillsRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_handle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle_lower: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skills: Option<Value>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(
		default,
		with = "crate::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
}
impl MemberSkillsRecord {
	pub fn skill_map(&self) -> Result<SkillMap> {
		skills::normalize(self.skills.as_ref())
	}
}

/// Merged skills view of one member.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSkills {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_id: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_handle: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub handle_lower: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub skills: Option<SkillMap>,
	#[serde(with = "crate::time_serde::option", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	#[serde(with = "crate::time_serde::option", skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<OffsetDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<String>,
}
impl Projectable for MemberSkills {
	type Field = SkillsField;

	fn clear(&mut self, field: SkillsField) {
		match field {
			SkillsField::UserId => self.user_id = None,
			SkillsField::UserHandle => self.user_handle = None,
			SkillsField::HandleLower => self.handle_lower = None,
			SkillsField::Skills => self.skills = None,
			SkillsField::CreatedAt => self.created_at = None,
			SkillsField::CreatedBy => self.created_by = None,
			SkillsField::UpdatedAt => self.updated_at = None,
			SkillsField::UpdatedBy => self.updated_by = None,
		}
	}
}

fn decode_embedded_value(name: &str, slot: &mut Option<Value>) -> Result<()> {
	let Some(Value::String(encoded)) = slot.as_ref() else {
		return Ok(());
	};
	let decoded = serde_json::from_str(encoded).map_err(|err| Error::DataFormat {
		message: format!("{name} is not valid JSON: {err}"),
	})?;

	*slot = Some(decoded);

	Ok(())
}

fn bucket_count(bucket: &str, value: &Value) -> Result<i64> {
	match value {
		Value::Null => Ok(0),
		Value::Number(number) => number
			.as_i64()
			.or_else(|| number.as_f64().map(|float| float as i64))
			.ok_or_else(|| Error::DataFormat {
				message: format!("distribution bucket {bucket} is out of range."),
			}),
		Value::String(raw) => raw.trim().parse::<i64>().map_err(|_| Error::DataFormat {
			message: format!("distribution bucket {bucket} is not numeric."),
		}),
		_ => Err(Error::DataFormat {
			message: format!("distribution bucket {bucket} is not numeric."),
		}),
	}
}

//! Normalization and merging of entered and aggregated skill maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

pub type SkillMap = BTreeMap<String, SkillEntry>;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tag_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hidden: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sources: Option<Vec<String>>,
}
impl SkillEntry {
	pub fn is_hidden(&self) -> bool {
		self.hidden.unwrap_or(false)
	}

	/// Overwrites only the attributes present on `patch`.
	pub fn apply(&mut self, patch: &SkillEntry) {
		if let Some(tag_name) = &patch.tag_name {
			self.tag_name = Some(tag_name.clone());
		}
		if let Some(hidden) = patch.hidden {
			self.hidden = Some(hidden);
		}
		if let Some(score) = patch.score {
			self.score = Some(score);
		}
		if let Some(sources) = &patch.sources {
			self.sources = Some(sources.clone());
		}
	}
}

/// Turns a stored skills value into a map. Stored rows may hold the map itself, a JSON string
/// encoding of it, or nothing.
pub fn normalize(raw: Option<&Value>) -> Result<SkillMap> {
	match raw {
		None | Some(Value::Null) => Ok(SkillMap::new()),
		Some(Value::String(encoded)) => {
			if encoded.trim().is_empty() {
				return Ok(SkillMap::new());
			}

			let decoded: Value = serde_json::from_str(encoded).map_err(|err| Error::DataFormat {
				message: format!("skills is not valid JSON: {err}"),
			})?;

			if decoded.is_string() {
				return Err(Error::DataFormat {
					message: "skills is doubly string-encoded.".to_string(),
				});
			}

			normalize(Some(&decoded))
		},
		Some(value @ Value::Object(_)) => SkillMap::deserialize(value).map_err(|err| {
			Error::DataFormat { message: format!("skills has an unexpected shape: {err}") }
		}),
		Some(other) => Err(Error::DataFormat {
			message: format!("skills must be an object, found {}.", json_kind(other)),
		}),
	}
}

/// Entered entries win; aggregated entries only contribute tags the member never entered.
pub fn merge(entered: SkillMap, aggregated: SkillMap) -> SkillMap {
	let mut merged = entered;

	for (tag, entry) in aggregated {
		merged.entry(tag).or_insert(entry);
	}

	merged
}

pub fn drop_hidden(skills: SkillMap) -> SkillMap {
	skills.into_iter().filter(|(_, entry)| !entry.is_hidden()).collect()
}

/// Validates a partial-update body: a non-empty object of tag id to partial entry.
pub fn parse_patch(body: &Value) -> Result<SkillMap> {
	let Value::Object(map) = body else {
		return Err(Error::InvalidInput { message: "Body must be a JSON object.".to_string() });
	};

	if map.is_empty() {
		return Err(Error::InvalidInput { message: "Body must contain at least one skill.".to_string() });
	}

	let mut patch = SkillMap::new();

	for (tag, value) in map {
		if tag.trim().is_empty() {
			return Err(Error::InvalidInput { message: "Skill ids must be non-empty.".to_string() });
		}
		if !value.is_object() {
			return Err(Error::InvalidInput { message: format!("Skill {tag} must be an object.") });
		}

		let entry = SkillEntry::deserialize(value).map_err(|err| Error::InvalidInput {
			message: format!("Skill {tag} is invalid: {err}"),
		})?;

		if let Some(score) = entry.score
			&& (!score.is_finite() || score < 0.0)
		{
			return Err(Error::InvalidInput {
				message: format!("Skill {tag} score must be a non-negative number."),
			});
		}

		patch.insert(tag.clone(), entry);
	}

	Ok(patch)
}

/// Applies `patch` onto `current`, creating entries for new tags.
pub fn apply_patch(current: &mut SkillMap, patch: &SkillMap) {
	for (tag, entry) in patch {
		current.entry(tag.clone()).or_default().apply(entry);
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

//! Payload-only Qdrant collections used as the profile, skills and statistics indexes.

use qdrant_client::{
	Qdrant,
	qdrant::{
		Condition, CountPointsBuilder, Filter, GetPointsBuilder, PointId, RetrievedPoint,
		ScrollPointsBuilder,
	},
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

/// Page size used when walking a collection with scroll.
const SCROLL_BATCH: u32 = 256;

pub struct Collections {
	pub profile: String,
	pub skills: String,
	pub stats: String,
	pub history_stats: String,
}

pub struct QdrantStore {
	pub client: Qdrant,
	pub collections: Collections,
}
impl QdrantStore {
	pub fn new(cfg: &roster_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collections: Collections {
				profile: cfg.profile_collection.clone(),
				skills: cfg.skills_collection.clone(),
				stats: cfg.stats_collection.clone(),
				history_stats: cfg.history_stats_collection.clone(),
			},
		})
	}

	/// Reads every payload matching `filter`, following scroll offsets until the last page.
	pub async fn scroll(&self, collection: &str, filter: Filter) -> Result<Vec<Value>> {
		let mut docs = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut request = ScrollPointsBuilder::new(collection)
				.filter(filter.clone())
				.limit(SCROLL_BATCH)
				.with_payload(true);

			if let Some(offset) = offset.take() {
				request = request.offset(offset);
			}

			let response = self.client.scroll(request).await?;

			for point in response.result {
				docs.push(payload_to_json(collection, point)?);
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(docs)
	}

	pub async fn count(&self, collection: &str, filter: Filter) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(collection).filter(filter).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>> {
		let response = self
			.client
			.get_points(
				GetPointsBuilder::new(collection, vec![PointId::from(id.to_string())])
					.with_payload(true),
			)
			.await?;

		response.result.into_iter().next().map(|point| payload_to_json(collection, point)).transpose()
	}
}

/// Point id of the statistics document for one member and group.
pub fn composite_point_id(user_id: i64, group_id: i64) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{user_id}_{group_id}").as_bytes())
}

/// Structured profile filters. Empty lists and `None` add no condition.
#[derive(Clone, Debug, Default)]
pub struct ProfileFilter {
	pub handles_lower: Vec<String>,
	pub user_ids: Vec<i64>,
	pub email: Option<String>,
	pub term: Option<String>,
	pub handle_prefix: Option<String>,
}
impl ProfileFilter {
	pub fn to_filter(&self) -> Filter {
		let mut conditions = Vec::new();

		if !self.handles_lower.is_empty() {
			conditions.push(Condition::matches("handleLower", self.handles_lower.clone()));
		}
		if !self.user_ids.is_empty() {
			conditions.push(Condition::matches("userId", self.user_ids.clone()));
		}
		if let Some(email) = &self.email {
			conditions.push(Condition::matches("email", email.clone()));
		}
		if let Some(term) = &self.term {
			conditions.push(Condition::matches_text("handle", term.clone()));
		}
		// `handleLower` carries a prefix-tokenized text index, so a text match is a prefix match.
		if let Some(prefix) = &self.handle_prefix {
			conditions.push(Condition::matches_text("handleLower", prefix.to_lowercase()));
		}

		Filter::must(conditions)
	}
}

pub fn handles_filter(handles_lower: &[String]) -> Filter {
	Filter::must([Condition::matches("handleLower", handles_lower.to_vec())])
}

/// `all` requires every skill id on the document; otherwise any one of them is enough.
pub fn skill_ids_filter(skill_ids: &[String], all: bool) -> Filter {
	if all {
		Filter::must(
			skill_ids.iter().map(|skill_id| Condition::matches("skillIds", skill_id.clone())),
		)
	} else {
		Filter::must([Condition::matches("skillIds", skill_ids.to_vec())])
	}
}

fn payload_to_json(collection: &str, point: RetrievedPoint) -> Result<Value> {
	if point.payload.is_empty() {
		return Err(Error::InvalidDocument {
			collection: collection.to_string(),
			message: "point has no payload".to_string(),
		});
	}

	let map = point
		.payload
		.into_iter()
		.map(|(key, value)| (key, value.into_json()))
		.collect::<Map<String, Value>>();

	Ok(Value::Object(map))
}

//! Statistics resolution: index first, then the document-store table for the record's shape.

use std::sync::Arc;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::task::JoinSet;

use roster_config::Tables;
use roster_domain::{
	fields::{self, FieldRegistry, FieldSet, Projectable},
	identity::Caller,
	models::{self, EmbeddedStats, HistoryStatsRecord, MemberProfile, StatsRecord},
};

use crate::{
	Error, KeyValueStore, Lookup, Result, RosterService, StatsIndex, member, search,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatKind {
	Member,
	History,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityTier {
	Public,
	Private,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
	/// Comma-separated group ids.
	pub group_ids: Option<String>,
	pub fields: Option<String>,
}

/// Where a record was finally read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatSource {
	Index,
	OverallTable,
	GroupTable,
}

#[derive(Clone, Debug)]
struct StatTables {
	public: String,
	private: String,
	group: String,
}
impl StatTables {
	fn for_kind(kind: StatKind, tables: &Tables) -> Self {
		match kind {
			StatKind::Member => Self {
				public: tables.stats_public.clone(),
				private: tables.stats_private.clone(),
				group: tables.stats_group.clone(),
			},
			StatKind::History => Self {
				public: tables.history_public.clone(),
				private: tables.history_private.clone(),
				group: tables.history_group.clone(),
			},
		}
	}
}

/// Resolves one statistics document per (member, group, tier).
#[derive(Clone)]
pub struct StatResolver {
	kind: StatKind,
	index: Arc<dyn StatsIndex>,
	store: Arc<dyn KeyValueStore>,
	tables: StatTables,
	default_group_id: i64,
}
impl StatResolver {
	pub fn new(
		kind: StatKind,
		index: Arc<dyn StatsIndex>,
		store: Arc<dyn KeyValueStore>,
		tables: &Tables,
		default_group_id: i64,
	) -> Self {
		Self { kind, index, store, tables: StatTables::for_kind(kind, tables), default_group_id }
	}

	/// Returns the raw document, or `None` once every source reported not-found. Index failures
	/// other than not-found propagate.
	pub async fn resolve(
		&self,
		user_id: i64,
		group_id: i64,
		tier: VisibilityTier,
	) -> Result<Option<Value>> {
		match self.index.get_by_composite_key(self.kind, user_id, group_id).await {
			Lookup::Found(doc) => return Ok(Some(doc)),
			Lookup::NotFound => {},
			Lookup::Failure(err) => return Err(err),
		}

		let user_key = user_id.to_string();
		let (source, lookup) = if group_id == self.default_group_id {
			let table = match tier {
				VisibilityTier::Public => &self.tables.public,
				VisibilityTier::Private => &self.tables.private,
			};

			(StatSource::OverallTable, self.store.get_by_key(table, &user_key).await)
		} else {
			let group_key = group_id.to_string();

			(
				StatSource::GroupTable,
				self.store.get_by_composite_key(&self.tables.group, &user_key, &group_key).await,
			)
		};

		tracing::debug!(user_id, group_id, source = ?source, "Statistics index miss, used fallback.");

		let Some(mut doc) = lookup.into_result()? else {
			return Ok(None);
		};

		if source == StatSource::OverallTable
			&& let Some(object) = doc.as_object_mut()
		{
			object.insert("groupId".to_string(), Value::from(self.default_group_id));
		}

		Ok(Some(doc))
	}

	/// Resolves every group concurrently, keeping request order and skipping absent groups.
	pub async fn resolve_groups(
		&self,
		user_id: i64,
		group_ids: &[i64],
		tier: VisibilityTier,
	) -> Result<Vec<Value>> {
		let mut tasks = JoinSet::new();

		for (idx, group_id) in group_ids.iter().copied().enumerate() {
			let resolver = self.clone();

			tasks.spawn(async move {
				let doc = resolver.resolve(user_id, group_id, tier).await;

				(idx, doc)
			});
		}

		let mut resolved = vec![None; group_ids.len()];

		while let Some(joined) = tasks.join_next().await {
			let (idx, doc) = joined?;

			resolved[idx] = doc?;
		}

		Ok(resolved.into_iter().flatten().collect())
	}
}

impl RosterService {
	pub async fn get_member_stats(
		&self,
		caller: Option<&Caller>,
		handle: &str,
		req: StatsRequest,
	) -> Result<Vec<StatsRecord>> {
		let mut records =
			self.load_stats::<StatsRecord>(StatKind::Member, caller, handle, &req).await?;

		for record in records.iter_mut() {
			if let Some(max_rating) = record.max_rating.as_mut()
				&& let Some(rating) = max_rating.rating
			{
				max_rating.rating_color = Some(self.palette.color_for(rating).to_string());
			}
		}

		Ok(project_all(records, req.fields.as_deref()))
	}

	pub async fn get_history_stats(
		&self,
		caller: Option<&Caller>,
		handle: &str,
		req: StatsRequest,
	) -> Result<Vec<HistoryStatsRecord>> {
		let records =
			self.load_stats::<HistoryStatsRecord>(StatKind::History, caller, handle, &req).await?;

		Ok(project_all(records, req.fields.as_deref()))
	}

	pub fn stat_resolver(&self, kind: StatKind) -> StatResolver {
		StatResolver::new(
			kind,
			self.backends.stats.clone(),
			self.backends.store.clone(),
			self.tables(),
			self.cfg.search.default_group_id,
		)
	}

	/// Private when the caller is the member, an admin or a machine principal.
	pub fn visibility_tier(&self, caller: Option<&Caller>, member: &MemberProfile) -> VisibilityTier {
		let handle_lower = member.lower_handle();

		if self.visibility.roles().can_manage_member(caller, member.user_id, handle_lower.as_deref())
		{
			VisibilityTier::Private
		} else {
			VisibilityTier::Public
		}
	}

	async fn load_stats<T>(
		&self,
		kind: StatKind,
		caller: Option<&Caller>,
		handle: &str,
		req: &StatsRequest,
	) -> Result<Vec<T>>
	where
		T: DeserializeOwned + EmbeddedStats,
	{
		let group_ids = parse_group_ids(req.group_ids.as_deref())?;
		let member = self.member_by_handle(handle).await?;
		let user_id = member::member_user_id(&member)?;
		let tier = self.visibility_tier(caller, &member);
		let group_ids =
			if group_ids.is_empty() { vec![self.cfg.search.default_group_id] } else { group_ids };
		let docs = self.stat_resolver(kind).resolve_groups(user_id, &group_ids, tier).await?;
		let entity = match kind {
			StatKind::Member => "member stats",
			StatKind::History => "history stats",
		};

		docs.into_iter()
			.map(|doc| {
				let mut record: T = models::decode(entity, doc)?;

				record.decode_embedded_blocks()?;

				Ok(record)
			})
			.collect()
	}
}

fn project_all<T>(records: Vec<T>, requested: Option<&str>) -> Vec<T>
where
	T: Projectable,
	T::Field: FieldRegistry,
{
	let fields = FieldSet::<T::Field>::parse_requested(requested);

	records.into_iter().map(|record| fields::project(record, &fields)).collect()
}

/// Parses comma-separated group ids, dropping repeats after their first occurrence.
fn parse_group_ids(raw: Option<&str>) -> Result<Vec<i64>> {
	let mut group_ids = Vec::new();

	for item in search::split_list(raw) {
		let group_id = item.parse::<i64>().map_err(|_| Error::BadRequest {
			message: format!("groupIds entry {item:?} is not an integer."),
		})?;

		if !group_ids.contains(&group_id) {
			group_ids.push(group_id);
		}
	}

	Ok(group_ids)
}

#[cfg(test)]
mod tests {
	use crate::stats::parse_group_ids;

	#[test]
	fn group_ids_keep_first_occurrence_order() {
		assert_eq!(parse_group_ids(Some("20, 10,20,30")).expect("Valid ids."), vec![20, 10, 30]);
		assert_eq!(parse_group_ids(None).expect("Valid ids."), Vec::<i64>::new());
		assert!(parse_group_ids(Some("10,abc")).is_err());
	}
}

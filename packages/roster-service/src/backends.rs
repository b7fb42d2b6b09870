//! Default collaborator implementations over Qdrant, Postgres and the verification service.

use std::sync::Arc;

use qdrant_client::qdrant::{Condition, Filter};
use serde_json::Value;

use roster_providers::verification::VerificationClient;
use roster_storage::{
	db::Db,
	documents::{self, NO_RANGE_KEY, ScanCriterion},
	qdrant::{self, ProfileFilter, QdrantStore},
};

use crate::{
	BoxFuture, KeyValueStore, Lookup, ProfileHits, ProfileIndex, ProfileQuery, Result,
	SkillOperator, SkillsIndex, StatKind, StatsIndex, VerificationProvider,
};

pub struct QdrantProfileIndex {
	qdrant: Arc<QdrantStore>,
}
impl QdrantProfileIndex {
	pub fn new(qdrant: Arc<QdrantStore>) -> Self {
		Self { qdrant }
	}

	async fn run(&self, query: &ProfileQuery) -> Result<ProfileHits> {
		let filter = ProfileFilter {
			handles_lower: query.handles_lower.clone(),
			user_ids: query.user_ids.clone(),
			email: query.email.clone(),
			term: query.term.clone(),
			handle_prefix: query.handle_prefix.clone(),
		}
		.to_filter();
		let collection = self.qdrant.collections.profile.as_str();
		let total = self.qdrant.count(collection, filter.clone()).await?;
		let docs = self.qdrant.scroll(collection, filter).await?;

		Ok(ProfileHits { total, docs })
	}
}
impl ProfileIndex for QdrantProfileIndex {
	fn query<'a>(&'a self, query: &'a ProfileQuery) -> BoxFuture<'a, Result<ProfileHits>> {
		Box::pin(self.run(query))
	}
}

pub struct QdrantSkillsIndex {
	qdrant: Arc<QdrantStore>,
}
impl QdrantSkillsIndex {
	pub fn new(qdrant: Arc<QdrantStore>) -> Self {
		Self { qdrant }
	}

	async fn scroll(&self, filter: Filter) -> Result<Vec<Value>> {
		Ok(self.qdrant.scroll(&self.qdrant.collections.skills, filter).await?)
	}
}
impl SkillsIndex for QdrantSkillsIndex {
	fn query_by_handles<'a>(
		&'a self,
		handles_lower: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(self.scroll(qdrant::handles_filter(handles_lower)))
	}

	fn query_by_skill_ids<'a>(
		&'a self,
		skill_ids: &'a [String],
		operator: SkillOperator,
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		let filter = qdrant::skill_ids_filter(skill_ids, operator == SkillOperator::And);

		Box::pin(self.scroll(filter))
	}
}

pub struct QdrantStatsIndex {
	qdrant: Arc<QdrantStore>,
	default_group_id: i64,
}
impl QdrantStatsIndex {
	pub fn new(qdrant: Arc<QdrantStore>, default_group_id: i64) -> Self {
		Self { qdrant, default_group_id }
	}

	fn collection(&self, kind: StatKind) -> &str {
		match kind {
			StatKind::Member => &self.qdrant.collections.stats,
			StatKind::History => &self.qdrant.collections.history_stats,
		}
	}

	async fn overall_by_handles(&self, handles_lower: &[String]) -> Result<Vec<Value>> {
		let mut filter = qdrant::handles_filter(handles_lower);

		filter.must.push(Condition::matches("groupId", self.default_group_id));

		Ok(self.qdrant.scroll(&self.qdrant.collections.stats, filter).await?)
	}

	async fn get(&self, kind: StatKind, user_id: i64, group_id: i64) -> Result<Option<Value>> {
		let id = qdrant::composite_point_id(user_id, group_id);

		Ok(self.qdrant.get(self.collection(kind), id).await?)
	}
}
impl StatsIndex for QdrantStatsIndex {
	fn query_by_handles<'a>(
		&'a self,
		handles_lower: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(self.overall_by_handles(handles_lower))
	}

	fn get_by_composite_key<'a>(
		&'a self,
		kind: StatKind,
		user_id: i64,
		group_id: i64,
	) -> BoxFuture<'a, Lookup<Value>> {
		Box::pin(async move { Lookup::from_result(self.get(kind, user_id, group_id).await) })
	}
}

pub struct PgKeyValueStore {
	db: Arc<Db>,
}
impl PgKeyValueStore {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}

	async fn get(&self, table: &str, hash_key: &str, range_key: &str) -> Result<Option<Value>> {
		Ok(documents::get_by_composite_key(&self.db, table, hash_key, range_key).await?)
	}

	async fn put(
		&self,
		table: &str,
		hash_key: &str,
		range_key: Option<&str>,
		doc: Value,
	) -> Result<Value> {
		let range_key = range_key.unwrap_or(NO_RANGE_KEY);

		Ok(documents::put(&self.db, table, hash_key, range_key, &doc).await?)
	}

	async fn scan_table(&self, table: &str, criteria: &[ScanCriterion]) -> Result<Vec<Value>> {
		Ok(documents::scan(&self.db, table, criteria).await?)
	}
}
impl KeyValueStore for PgKeyValueStore {
	fn get_by_key<'a>(&'a self, table: &'a str, key: &'a str) -> BoxFuture<'a, Lookup<Value>> {
		Box::pin(async move { Lookup::from_result(self.get(table, key, NO_RANGE_KEY).await) })
	}

	fn get_by_composite_key<'a>(
		&'a self,
		table: &'a str,
		hash_key: &'a str,
		range_key: &'a str,
	) -> BoxFuture<'a, Lookup<Value>> {
		Box::pin(async move { Lookup::from_result(self.get(table, hash_key, range_key).await) })
	}

	fn update<'a>(
		&'a self,
		table: &'a str,
		hash_key: &'a str,
		range_key: Option<&'a str>,
		doc: Value,
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(self.put(table, hash_key, range_key, doc))
	}

	fn scan<'a>(
		&'a self,
		table: &'a str,
		criteria: &'a [ScanCriterion],
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(self.scan_table(table, criteria))
	}
}

pub struct HttpVerification {
	client: VerificationClient,
}
impl HttpVerification {
	pub fn new(client: VerificationClient) -> Self {
		Self { client }
	}

	async fn check(&self, user_id: i64) -> Result<bool> {
		Ok(self.client.is_verified(user_id).await?)
	}
}
impl VerificationProvider for HttpVerification {
	fn is_verified<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<bool>> {
		Box::pin(self.check(user_id))
	}
}

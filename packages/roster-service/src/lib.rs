pub mod backends;
pub mod distribution;
pub mod merge;
pub mod search;
pub mod skills;
pub mod skills_search;
pub mod stats;
pub mod verification;

mod error;
mod member;

pub use distribution::DistributionRequest;
pub use error::{Error, Result};
pub use search::{AutocompleteRequest, SearchMembersRequest};
pub use skills::MemberSkillsRequest;
pub use skills_search::{SearchBySkillsRequest, SkillOperator};
pub use stats::{StatKind, StatsRequest, VisibilityTier};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use roster_config::{Config, Tables};
use roster_domain::{rating::RatingPalette, visibility::VisibilityPolicy};
use roster_providers::verification::VerificationClient;
use roster_storage::{db::Db, documents::ScanCriterion, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a single-record read. `NotFound` drives fallback selection; `Failure` never does.
#[derive(Debug)]
pub enum Lookup<T> {
	Found(T),
	NotFound,
	Failure(Error),
}
impl<T> Lookup<T> {
	pub fn from_result(result: Result<Option<T>>) -> Self {
		match result {
			Ok(Some(value)) => Self::Found(value),
			Ok(None) => Self::NotFound,
			Err(err) => Self::Failure(err),
		}
	}

	/// Collapses the lookup for callers with no fallback: absence becomes `Ok(None)`.
	pub fn into_result(self) -> Result<Option<T>> {
		match self {
			Self::Found(value) => Ok(Some(value)),
			Self::NotFound => Ok(None),
			Self::Failure(err) => Err(err),
		}
	}
}

/// Structured profile-index query. Empty lists and `None` add no condition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileQuery {
	pub handles_lower: Vec<String>,
	pub user_ids: Vec<i64>,
	pub email: Option<String>,
	pub term: Option<String>,
	pub handle_prefix: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileHits {
	pub total: u64,
	pub docs: Vec<Value>,
}

/// Every index read returns all matching documents; callers sort and paginate the full set.
pub trait ProfileIndex
where
	Self: Send + Sync,
{
	fn query<'a>(&'a self, query: &'a ProfileQuery) -> BoxFuture<'a, Result<ProfileHits>>;
}

pub trait SkillsIndex
where
	Self: Send + Sync,
{
	fn query_by_handles<'a>(&'a self, handles_lower: &'a [String])
	-> BoxFuture<'a, Result<Vec<Value>>>;

	fn query_by_skill_ids<'a>(
		&'a self,
		skill_ids: &'a [String],
		operator: SkillOperator,
	) -> BoxFuture<'a, Result<Vec<Value>>>;
}

pub trait StatsIndex
where
	Self: Send + Sync,
{
	/// Overall member statistics for the given handles.
	fn query_by_handles<'a>(&'a self, handles_lower: &'a [String])
	-> BoxFuture<'a, Result<Vec<Value>>>;

	fn get_by_composite_key<'a>(
		&'a self,
		kind: StatKind,
		user_id: i64,
		group_id: i64,
	) -> BoxFuture<'a, Lookup<Value>>;
}

pub trait KeyValueStore
where
	Self: Send + Sync,
{
	fn get_by_key<'a>(&'a self, table: &'a str, key: &'a str) -> BoxFuture<'a, Lookup<Value>>;

	fn get_by_composite_key<'a>(
		&'a self,
		table: &'a str,
		hash_key: &'a str,
		range_key: &'a str,
	) -> BoxFuture<'a, Lookup<Value>>;

	/// Replaces the whole record and returns what was stored.
	fn update<'a>(
		&'a self,
		table: &'a str,
		hash_key: &'a str,
		range_key: Option<&'a str>,
		doc: Value,
	) -> BoxFuture<'a, Result<Value>>;

	fn scan<'a>(
		&'a self,
		table: &'a str,
		criteria: &'a [ScanCriterion],
	) -> BoxFuture<'a, Result<Vec<Value>>>;
}

pub trait VerificationProvider
where
	Self: Send + Sync,
{
	fn is_verified<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<bool>>;
}

#[derive(Clone)]
pub struct Backends {
	pub profiles: Arc<dyn ProfileIndex>,
	pub skills: Arc<dyn SkillsIndex>,
	pub stats: Arc<dyn StatsIndex>,
	pub store: Arc<dyn KeyValueStore>,
	pub verification: Arc<dyn VerificationProvider>,
}
impl Backends {
	/// Wires the Qdrant indexes, the Postgres document store and the verification client.
	pub fn connected(
		cfg: &Config,
		db: Arc<Db>,
		qdrant: Arc<QdrantStore>,
		verification: VerificationClient,
	) -> Self {
		let default_group_id = cfg.search.default_group_id;

		Self {
			profiles: Arc::new(backends::QdrantProfileIndex::new(qdrant.clone())),
			skills: Arc::new(backends::QdrantSkillsIndex::new(qdrant.clone())),
			stats: Arc::new(backends::QdrantStatsIndex::new(qdrant, default_group_id)),
			store: Arc::new(backends::PgKeyValueStore::new(db)),
			verification: Arc::new(backends::HttpVerification::new(verification)),
		}
	}
}

pub struct RosterService {
	pub cfg: Config,
	pub backends: Backends,
	pub visibility: VisibilityPolicy,
	pub palette: RatingPalette,
}
impl RosterService {
	pub fn new(
		cfg: Config,
		db: Arc<Db>,
		qdrant: Arc<QdrantStore>,
		verification: VerificationClient,
	) -> Result<Self> {
		let backends = Backends::connected(&cfg, db, qdrant, verification);

		Self::with_backends(cfg, backends)
	}

	pub fn with_backends(cfg: Config, backends: Backends) -> Result<Self> {
		let visibility = VisibilityPolicy::from_config(&cfg.fields, &cfg.roles)?;
		let palette = RatingPalette::from_config(&cfg.rating_colors);

		Ok(Self { cfg, backends, visibility, palette })
	}

	pub(crate) fn tables(&self) -> &Tables {
		&self.cfg.storage.tables
	}
}

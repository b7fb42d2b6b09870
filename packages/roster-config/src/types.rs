use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	#[serde(default)]
	pub fields: Fields,
	#[serde(default)]
	pub roles: Roles,
	#[serde(default = "RatingColor::default_palette")]
	pub rating_colors: Vec<RatingColor>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
	#[serde(default)]
	pub tables: Tables,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub profile_collection: String,
	pub skills_collection: String,
	pub stats_collection: String,
	pub history_stats_collection: String,
}

/// Names of the key-value tables inside the document store.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Tables {
	pub members: String,
	pub entered_skills: String,
	pub aggregated_skills: String,
	pub stats_public: String,
	pub stats_private: String,
	pub stats_group: String,
	pub history_public: String,
	pub history_private: String,
	pub history_group: String,
	pub distribution: String,
}
impl Default for Tables {
	fn default() -> Self {
		Self {
			members: "members".to_string(),
			entered_skills: "member_entered_skills".to_string(),
			aggregated_skills: "member_aggregated_skills".to_string(),
			stats_public: "member_stats".to_string(),
			stats_private: "member_stats_private".to_string(),
			stats_group: "member_group_stats".to_string(),
			history_public: "member_history_stats".to_string(),
			history_private: "member_history_stats_private".to_string(),
			history_group: "member_group_history_stats".to_string(),
			distribution: "member_distribution_stats".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub verification: VerificationProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct VerificationProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub max_per_page: u32,
	pub verification_concurrency: u32,
	#[serde(default = "default_group_id")]
	pub default_group_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fields {
	/// Member fields only machine principals and admins may read.
	pub secure: Vec<String>,
	/// Member fields only machine principals and autocomplete-privileged callers may read.
	pub communication: Vec<String>,
}
impl Default for Fields {
	fn default() -> Self {
		Self {
			secure: vec!["email".to_string(), "createdBy".to_string(), "updatedBy".to_string()],
			communication: vec!["email".to_string()],
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Roles {
	pub admin: Vec<String>,
	pub autocomplete: Vec<String>,
	pub search_by_email: Vec<String>,
}
impl Default for Roles {
	fn default() -> Self {
		Self {
			admin: vec!["administrator".to_string()],
			autocomplete: vec!["autocomplete".to_string()],
			search_by_email: vec!["administrator".to_string(), "search by email".to_string()],
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct RatingColor {
	/// Exclusive upper bound of the bucket. Omitted on the last, open-ended bucket.
	pub limit: Option<u32>,
	pub color: String,
}
impl RatingColor {
	pub fn default_palette() -> Vec<Self> {
		[
			(Some(900), "#9D9FA0"),
			(Some(1_200), "#69C329"),
			(Some(1_500), "#616BD5"),
			(Some(2_200), "#FCD617"),
			(None, "#EF3A3A"),
		]
		.into_iter()
		.map(|(limit, color)| Self { limit, color: color.to_string() })
		.collect()
	}
}

fn default_group_id() -> i64 {
	10
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Fields, Postgres, Providers, Qdrant, RatingColor, Roles, Search, Service, Storage,
	Tables, VerificationProviderConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("storage.qdrant.profile_collection", &cfg.storage.qdrant.profile_collection),
		("storage.qdrant.skills_collection", &cfg.storage.qdrant.skills_collection),
		("storage.qdrant.stats_collection", &cfg.storage.qdrant.stats_collection),
		("storage.qdrant.history_stats_collection", &cfg.storage.qdrant.history_stats_collection),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	let tables = &cfg.storage.tables;

	for (label, value) in [
		("storage.tables.members", &tables.members),
		("storage.tables.entered_skills", &tables.entered_skills),
		("storage.tables.aggregated_skills", &tables.aggregated_skills),
		("storage.tables.stats_public", &tables.stats_public),
		("storage.tables.stats_private", &tables.stats_private),
		("storage.tables.stats_group", &tables.stats_group),
		("storage.tables.history_public", &tables.history_public),
		("storage.tables.history_private", &tables.history_private),
		("storage.tables.history_group", &tables.history_group),
		("storage.tables.distribution", &tables.distribution),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.providers.verification.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.verification.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.verification.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.verification.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_per_page == 0 {
		return Err(Error::Validation {
			message: "search.max_per_page must be greater than zero.".to_string(),
		});
	}
	if cfg.search.verification_concurrency == 0 {
		return Err(Error::Validation {
			message: "search.verification_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.rating_colors.is_empty() {
		return Err(Error::Validation {
			message: "rating_colors must be non-empty.".to_string(),
		});
	}

	let last = cfg.rating_colors.len() - 1;
	let mut previous: Option<u32> = None;

	for (idx, bucket) in cfg.rating_colors.iter().enumerate() {
		if bucket.color.trim().is_empty() {
			return Err(Error::Validation {
				message: "rating_colors.color must be non-empty.".to_string(),
			});
		}

		match bucket.limit {
			Some(limit) => {
				if previous.map(|prev| limit <= prev).unwrap_or(false) {
					return Err(Error::Validation {
						message: "rating_colors.limit must be strictly ascending.".to_string(),
					});
				}

				previous = Some(limit);
			},
			None if idx != last => {
				return Err(Error::Validation {
					message: "Only the last rating_colors entry may omit its limit.".to_string(),
				});
			},
			None => {},
		}
	}

	for (label, roles) in [
		("roles.admin", &cfg.roles.admin),
		("roles.autocomplete", &cfg.roles.autocomplete),
		("roles.search_by_email", &cfg.roles.search_by_email),
	] {
		if roles.iter().any(|role| role.is_empty()) {
			return Err(Error::Validation {
				message: format!("{label} entries must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for roles in
		[&mut cfg.roles.admin, &mut cfg.roles.autocomplete, &mut cfg.roles.search_by_email]
	{
		for role in roles.iter_mut() {
			*role = role.trim().to_lowercase();
		}
	}

	for fields in [&mut cfg.fields.secure, &mut cfg.fields.communication] {
		for field in fields.iter_mut() {
			*field = field.trim().to_string();
		}
	}

	cfg.providers.verification.api_base =
		cfg.providers.verification.api_base.trim_end_matches('/').to_string();
}

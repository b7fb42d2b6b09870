//! Enumerated output-field registries and the projection built on them.
//!
//! Every entity that callers can trim with a `fields` parameter owns one registry enum. The
//! registry fixes the canonical order and the wire name of each field, so projection never has
//! to look fields up by string at runtime.

use std::fmt;

pub trait FieldRegistry
where
	Self: Copy + Eq + fmt::Debug + 'static,
{
	const ALL: &'static [Self];

	fn name(self) -> &'static str;

	fn parse(name: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|field| field.name() == name)
	}
}

/// Records whose fields can be cleared one registry entry at a time.
pub trait Projectable {
	type Field: FieldRegistry;

	fn clear(&mut self, field: Self::Field);
}

/// Ordered subset of a registry, always kept in canonical order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSet<F>
where
	F: FieldRegistry,
{
	fields: Vec<F>,
}
impl<F> FieldSet<F>
where
	F: FieldRegistry,
{
	pub fn all() -> Self {
		Self { fields: F::ALL.to_vec() }
	}

	pub fn from_fields(fields: impl IntoIterator<Item = F>) -> Self {
		let wanted = fields.into_iter().collect::<Vec<_>>();

		Self { fields: F::ALL.iter().copied().filter(|field| wanted.contains(field)).collect() }
	}

	/// Parses a comma-separated request. Unknown names are dropped; a blank or absent request
	/// selects every field.
	pub fn parse_requested(raw: Option<&str>) -> Self {
		let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
			return Self::all();
		};

		Self::from_fields(raw.split(',').filter_map(|name| F::parse(name.trim())))
	}

	pub fn contains(&self, field: F) -> bool {
		self.fields.contains(&field)
	}

	pub fn without_names(&self, names: &[&str]) -> Self {
		Self {
			fields: self
				.fields
				.iter()
				.copied()
				.filter(|field| !names.contains(&field.name()))
				.collect(),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
		self.fields.iter().copied()
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.iter().map(F::name).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

pub fn project<T>(mut record: T, fields: &FieldSet<T::Field>) -> T
where
	T: Projectable,
{
	for field in T::Field::ALL.iter().copied() {
		if !fields.contains(field) {
			record.clear(field);
		}
	}

	record
}

macro_rules! field_registry {
	($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($variant),+
		}
		impl FieldRegistry for $name {
			const ALL: &'static [Self] = &[$(Self::$variant),+];

			fn name(self) -> &'static str {
				match self {
					$(Self::$variant => $wire),+
				}
			}
		}
	};
}

field_registry! {
	/// Fields of a merged member record.
	MemberField {
		UserId => "userId",
		Handle => "handle",
		HandleLower => "handleLower",
		FirstName => "firstName",
		LastName => "lastName",
		Description => "description",
		Email => "email",
		Addresses => "addresses",
		HomeCountryCode => "homeCountryCode",
		CompetitionCountryCode => "competitionCountryCode",
		PhotoUrl => "photoURL",
		Tracks => "tracks",
		Status => "status",
		CreatedAt => "createdAt",
		CreatedBy => "createdBy",
		UpdatedAt => "updatedAt",
		UpdatedBy => "updatedBy",
		MaxRating => "maxRating",
		Skills => "skills",
		Stats => "stats",
		EmsiSkills => "emsiSkills",
		Verified => "verified",
		NumberOfChallengesWon => "numberOfChallengesWon",
		NumberOfChallengesPlaced => "numberOfChallengesPlaced",
	}
}

field_registry! {
	/// Fields returned by handle autocomplete.
	AutocompleteField {
		UserId => "userId",
		Handle => "handle",
		HandleLower => "handleLower",
		FirstName => "firstName",
		LastName => "lastName",
		PhotoUrl => "photoURL",
		Email => "email",
	}
}
impl AutocompleteField {
	pub fn member_field(self) -> MemberField {
		match self {
			Self::UserId => MemberField::UserId,
			Self::Handle => MemberField::Handle,
			Self::HandleLower => MemberField::HandleLower,
			Self::FirstName => MemberField::FirstName,
			Self::LastName => MemberField::LastName,
			Self::PhotoUrl => MemberField::PhotoUrl,
			Self::Email => MemberField::Email,
		}
	}
}

field_registry! {
	/// Fields of a member statistics record.
	StatsField {
		UserId => "userId",
		GroupId => "groupId",
		Handle => "handle",
		HandleLower => "handleLower",
		MaxRating => "maxRating",
		Challenges => "challenges",
		Wins => "wins",
		Develop => "DEVELOP",
		Design => "DESIGN",
		DataScience => "DATA_SCIENCE",
		Copilot => "COPILOT",
		CreatedAt => "createdAt",
		CreatedBy => "createdBy",
		UpdatedAt => "updatedAt",
		UpdatedBy => "updatedBy",
	}
}
impl StatsField {
	/// The statistics shape embedded in merged search results.
	pub fn search_set() -> FieldSet<Self> {
		FieldSet::from_fields([
			Self::UserId,
			Self::GroupId,
			Self::Handle,
			Self::HandleLower,
			Self::MaxRating,
			Self::Challenges,
			Self::Wins,
			Self::Develop,
			Self::Design,
			Self::DataScience,
			Self::Copilot,
		])
	}
}

field_registry! {
	HistoryStatsField {
		UserId => "userId",
		GroupId => "groupId",
		Handle => "handle",
		HandleLower => "handleLower",
		Develop => "DEVELOP",
		DataScience => "DATA_SCIENCE",
		CreatedAt => "createdAt",
		CreatedBy => "createdBy",
		UpdatedAt => "updatedAt",
		UpdatedBy => "updatedBy",
	}
}

field_registry! {
	DistributionField {
		Track => "track",
		SubTrack => "subTrack",
		Distribution => "distribution",
		CreatedAt => "createdAt",
		CreatedBy => "createdBy",
		UpdatedAt => "updatedAt",
		UpdatedBy => "updatedBy",
	}
}

field_registry! {
	SkillsField {
		UserId => "userId",
		UserHandle => "userHandle",
		HandleLower => "handleLower",
		Skills => "skills",
		CreatedAt => "createdAt",
		CreatedBy => "createdBy",
		UpdatedAt => "updatedAt",
		UpdatedBy => "updatedBy",
	}
}

use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}
impl SortOrder {
	pub fn parse(raw: Option<&str>) -> Result<Self> {
		match raw.map(|raw| raw.trim().to_lowercase()).as_deref() {
			None | Some("") | Some("asc") => Ok(Self::Asc),
			Some("desc") => Ok(Self::Desc),
			Some(other) => Err(Error::InvalidInput {
				message: format!("sortOrder must be asc or desc, found {other:?}."),
			}),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemberSortKey {
	UserId,
	Handle,
	#[default]
	HandleLower,
	FirstName,
	LastName,
	MaxRating,
	NumberOfChallengesWon,
	NumberOfChallengesPlaced,
	CreatedAt,
	UpdatedAt,
}
impl MemberSortKey {
	pub fn parse(raw: Option<&str>) -> Result<Self> {
		let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
			return Ok(Self::default());
		};

		match raw {
			"userId" => Ok(Self::UserId),
			"handle" => Ok(Self::Handle),
			"handleLower" => Ok(Self::HandleLower),
			"firstName" => Ok(Self::FirstName),
			"lastName" => Ok(Self::LastName),
			"maxRating" => Ok(Self::MaxRating),
			"numberOfChallengesWon" => Ok(Self::NumberOfChallengesWon),
			"numberOfChallengesPlaced" => Ok(Self::NumberOfChallengesPlaced),
			"createdAt" => Ok(Self::CreatedAt),
			"updatedAt" => Ok(Self::UpdatedAt),
			other =>
				Err(Error::InvalidInput { message: format!("sortBy {other:?} is not supported.") }),
		}
	}
}

/// A comparable value extracted for one sort key. Missing values sort first when ascending.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
	Missing,
	Int(i64),
	Text(String),
	Time(OffsetDateTime),
}

pub trait SortableMember {
	fn sort_value(&self, key: MemberSortKey) -> SortValue;

	fn handle_lower(&self) -> &str;
}

/// Stable sort on `key` in `order`, then `handleLower` ascending.
pub fn sort_members<T>(members: &mut [T], key: MemberSortKey, order: SortOrder)
where
	T: SortableMember,
{
	members.sort_by(|left, right| {
		let primary = left.sort_value(key).cmp(&right.sort_value(key));
		let primary = match order {
			SortOrder::Asc => primary,
			SortOrder::Desc => primary.reverse(),
		};

		match primary {
			Ordering::Equal => left.handle_lower().cmp(right.handle_lower()),
			ordering => ordering,
		}
	});
}

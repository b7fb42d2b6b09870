//! RFC 3339 (de)serialization for audit timestamps stored inside documents.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}

/// Accepts RFC 3339 text or a bare epoch-milliseconds number rendered as text.
pub fn parse(raw: &str) -> Result<OffsetDateTime, String> {
	if let Ok(millis) = raw.trim().parse::<i64>() {
		return OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
			.map_err(|err| err.to_string());
	}

	OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| err.to_string())
}

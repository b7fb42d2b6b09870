use serde::{Deserialize as _, Deserializer, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => crate::time_serde::serialize(value, serializer),
		None => serializer.serialize_none(),
	}
}

/// Stored documents carry either RFC 3339 strings or epoch milliseconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(raw)) =>
			crate::time_serde::parse(&raw).map(Some).map_err(serde::de::Error::custom),
		Some(Value::Number(number)) => match number.as_i64() {
			Some(millis) => crate::time_serde::parse(&millis.to_string())
				.map(Some)
				.map_err(serde::de::Error::custom),
			None => Err(serde::de::Error::custom("timestamp must be an integer")),
		},
		Some(other) => Err(serde::de::Error::custom(format!("unexpected timestamp {other}"))),
	}
}

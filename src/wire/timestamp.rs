//! Timestamps on the wire.
//!
//! Writes always use `yyyy-MM-ddTHH:mm:ss.fffZ` in UTC. Reads try that exact layout first and
//! then fall back to RFC 3339, ISO 8601, and a few offset-less layouts that are taken as UTC.

// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
use time::{
	Date, PrimitiveDateTime, Time, UtcOffset,
	format_description::{
		BorrowedFormatItem,
		well_known::{Iso8601, Rfc3339},
	},
	macros::format_description,
};
// self
use crate::{_prelude::*, error::ParseError};

const WIRE: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
const LOCAL_T: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
const LOCAL_SPACE: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats `value` as `yyyy-MM-ddTHH:mm:ss.fffZ`, converting to UTC first.
pub fn format(value: &OffsetDateTime) -> Result<String, ParseError> {
	value.to_offset(UtcOffset::UTC).format(WIRE).map_err(|_| ParseError::Timestamp {
		value: value.to_string(),
	})
}

/// Parses any accepted timestamp layout into a UTC instant.
pub fn parse(raw: &str) -> Result<OffsetDateTime, ParseError> {
	let raw = raw.trim();

	if let Ok(strict) = PrimitiveDateTime::parse(raw, WIRE) {
		return Ok(strict.assume_utc());
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(moment.to_offset(UtcOffset::UTC));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
		return Ok(moment.to_offset(UtcOffset::UTC));
	}

	for layout in [LOCAL_T, LOCAL_SPACE] {
		if let Ok(local) = PrimitiveDateTime::parse(raw, layout) {
			return Ok(local.assume_utc());
		}
	}

	if let Ok(date) = Date::parse(raw, DATE_ONLY) {
		return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
	}

	Err(ParseError::Timestamp { value: raw.to_owned() })
}

/// Serializes a required timestamp.
pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = format(value).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

/// Deserializes a required timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(DeError::custom)
}

/// Nullable timestamp; pair with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod option {
	// crates.io
	use serde::{Deserializer, Serializer, de::Error as DeError};
	// self
	use crate::_prelude::*;

	/// Serializes an optional timestamp.
	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(moment) => {
				let formatted = super::format(moment).map_err(serde::ser::Error::custom)?;

				serializer.serialize_some(&formatted)
			},
			None => serializer.serialize_none(),
		}
	}

	/// Deserializes an optional timestamp; `null` becomes `None`.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?
			.map(|raw| super::parse(&raw).map_err(DeError::custom))
			.transpose()
	}
}

//! Durations on the wire are whole seconds.
//!
//! Use `#[serde(with = "wire::duration::seconds")]` for required fields and
//! `#[serde(default, skip_serializing_if = "Option::is_none", with = "wire::duration::option_seconds")]`
//! for nullable ones; the `default` keeps an absent value as `None` rather than zero.

/// Required [`Duration`](time::Duration) encoded as whole seconds.
pub mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	/// Writes the whole-second count; sub-second parts are truncated.
	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	/// Reads a whole-second count.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

/// Nullable [`Duration`](time::Duration) encoded as whole seconds.
pub mod option_seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	/// Writes the whole-second count, or `null` for `None`.
	pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(duration) => serializer.serialize_some(&duration.whole_seconds()),
			None => serializer.serialize_none(),
		}
	}

	/// Reads a whole-second count; `null` becomes `None`.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::seconds))
	}
}

//! JSON wire format shared by every request and response body.
//!
//! The service speaks snake_case JSON. Wire structs follow four rules:
//!
//! - Fields are renamed with `#[serde(rename_all = "snake_case")]`.
//! - Enumerations serialize as their snake_case variant names, never ordinals.
//! - Optional fields are omitted rather than written as `null` (`skip_serializing_if`).
//! - Durations and timestamps go through [`duration`] and [`timestamp`].
//!
//! Decoding runs through `serde_path_to_error`, so a [`ParseError::Json`] names the JSON path
//! that violated the contract.

pub mod duration;
pub mod timestamp;

// self
use crate::{_prelude::*, error::ParseError};

/// Encodes `value` as a JSON byte buffer.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, ParseError>
where
	T: ?Sized + Serialize,
{
	serde_json::to_vec(value).map_err(ParseError::Encode)
}

/// Encodes `value` as a JSON string.
pub fn to_string<T>(value: &T) -> Result<String, ParseError>
where
	T: ?Sized + Serialize,
{
	serde_json::to_string(value).map_err(ParseError::Encode)
}

/// Decodes a JSON byte buffer, labelling failures with `context`.
pub fn from_slice<T>(context: &'static str, bytes: &[u8]) -> Result<T, ParseError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);
	let value = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ParseError::Json { context, source })?;

	de.end().map_err(|source| ParseError::Trailing { context, source })?;

	Ok(value)
}

/// Decodes a JSON string, labelling failures with `context`.
pub fn from_str<T>(context: &'static str, raw: &str) -> Result<T, ParseError>
where
	T: DeserializeOwned,
{
	from_slice(context, raw.as_bytes())
}

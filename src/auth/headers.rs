//! Request-ready header set derived from a session, its device signature, and the client
//! identity.

// crates.io
use ::http::{
	HeaderMap, HeaderValue,
	header::{AUTHORIZATION, Iter},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessSession, DeviceSignature},
	error::ParseError,
	service::ClientIdentity,
};

/// Client-canary header name.
pub const X_CANARY: &str = "x-canary";
/// Device-identity header name.
pub const X_DEVICE_ID: &str = "x-device-id";
/// Device-signature header name.
pub const X_SIGNATURE: &str = "x-signature";

/// Immutable header set attached to every authenticated call.
///
/// Built once per session rotation and shared by reference afterwards; it is never edited in
/// place.
#[derive(Clone, PartialEq, Eq)]
pub struct OutgoingHeaderSet(HeaderMap);
impl OutgoingHeaderSet {
	/// Builds the header set for `session` signed by `signature`.
	pub fn build(
		session: &AccessSession,
		signature: &DeviceSignature,
		identity: &ClientIdentity,
	) -> Result<Self, ParseError> {
		let mut map = HeaderMap::with_capacity(4);
		let mut authorization =
			header_value("authorization", &format!("Bearer {}", session.access_token.expose()))?;
		let mut signed = header_value(X_SIGNATURE, signature.primary())?;

		authorization.set_sensitive(true);
		signed.set_sensitive(true);
		map.insert(AUTHORIZATION, authorization);
		map.insert(X_CANARY, header_value(X_CANARY, identity.canary())?);
		map.insert(X_DEVICE_ID, header_value(X_DEVICE_ID, &session.device_id)?);
		map.insert(X_SIGNATURE, signed);

		Ok(Self(map))
	}

	/// Looks up a header value as a string.
	pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
		self.0.get(name.as_ref()).and_then(|value| value.to_str().ok())
	}

	/// Iterates over every header in the set.
	pub fn iter(&self) -> Iter<'_, HeaderValue> {
		self.0.iter()
	}

	/// Borrows the underlying header map.
	pub fn as_header_map(&self) -> &HeaderMap {
		&self.0
	}

	/// Writes every header into `target`, replacing same-named entries.
	pub fn apply_to(&self, target: &mut HeaderMap) {
		for (name, value) in self.0.iter() {
			target.insert(name.clone(), value.clone());
		}
	}
}
impl Debug for OutgoingHeaderSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (name, value) in self.0.iter() {
			if value.is_sensitive() {
				map.entry(&name.as_str(), &"<redacted>");
			} else {
				map.entry(&name.as_str(), &value.to_str().unwrap_or("<binary>"));
			}
		}

		map.finish()
	}
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ParseError> {
	HeaderValue::from_str(value).map_err(|_| ParseError::InvalidHeaderValue { name })
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::auth::{DeviceId, TokenSecret, UserId};

	fn session(access: &str) -> AccessSession {
		AccessSession {
			access_token: TokenSecret::new(access),
			refresh_token: TokenSecret::new("R1"),
			token_type: Some("Bearer".into()),
			issued_at: datetime!(2024-03-01 08:00:00 UTC),
			expire_at: datetime!(2024-03-01 10:00:00 UTC),
			device_id: DeviceId::new("D1").expect("Device fixture should be valid."),
			user_id: UserId::new("U1").expect("User fixture should be valid."),
		}
	}

	fn signature(value: &str) -> DeviceSignature {
		DeviceSignature { signature_values: vec![value.into(), "ignored".into()] }
	}

	#[test]
	fn builds_all_four_headers() {
		let headers =
			OutgoingHeaderSet::build(&session("A1"), &signature("S1"), &ClientIdentity::default())
				.expect("Header set should build.");

		assert_eq!(headers.get("authorization"), Some("Bearer A1"));
		assert_eq!(headers.get("x-canary"), Some("client=web,app=adrive,version=v4.0.0"));
		assert_eq!(headers.get("x-device-id"), Some("D1"));
		assert_eq!(headers.get("x-signature"), Some("S1"));
		assert_eq!(headers.iter().count(), 4);
	}

	#[test]
	fn apply_replaces_same_named_headers() {
		let headers =
			OutgoingHeaderSet::build(&session("A1"), &signature("S1"), &ClientIdentity::default())
				.expect("Header set should build.");
		let mut target = HeaderMap::new();

		target.insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
		target.insert("content-type", HeaderValue::from_static("application/json"));
		headers.apply_to(&mut target);

		assert_eq!(target.get(AUTHORIZATION).and_then(|v| v.to_str().ok()), Some("Bearer A1"));
		assert_eq!(target.get_all(AUTHORIZATION).iter().count(), 1);
		assert_eq!(target.len(), 5);
	}

	#[test]
	fn debug_output_redacts_credentials() {
		let headers =
			OutgoingHeaderSet::build(&session("A1"), &signature("S1"), &ClientIdentity::default())
				.expect("Header set should build.");
		let rendered = format!("{headers:?}");

		assert!(!rendered.contains("A1"));
		assert!(!rendered.contains("S1"));
		assert!(rendered.contains("D1"));
	}

	#[test]
	fn rejects_values_that_cannot_travel_in_headers() {
		let err = OutgoingHeaderSet::build(
			&session("A1\nInjected: yes"),
			&signature("S1"),
			&ClientIdentity::default(),
		)
		.expect_err("Line breaks must not reach the wire.");

		assert!(matches!(err, ParseError::InvalidHeaderValue { name: "authorization" }));
	}
}

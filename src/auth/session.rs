//! Access sessions and the token-endpoint wire models they are minted from.

// self
use crate::{
	_prelude::*,
	auth::{DeviceId, TokenSecret, UserId},
	error::ParseError,
	wire,
};

/// Grant types understood by the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Exchange a refresh token for a new access token.
	RefreshToken,
}

/// Body POSTed to the token endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RefreshRequest<'a> {
	/// Refresh credential being exchanged.
	pub refresh_token: &'a str,
	/// Always [`GrantType::RefreshToken`].
	pub grant_type: GrantType,
}
impl<'a> RefreshRequest<'a> {
	/// Builds the refresh exchange body for `refresh_token`.
	pub fn new(refresh_token: &'a TokenSecret) -> Self {
		Self { refresh_token: refresh_token.expose(), grant_type: GrantType::RefreshToken }
	}
}

/// Successful token-endpoint response. Unknown fields are ignored.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TokenResponse {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token; absent means the current one stays valid.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Token type label reported by the service (normally `Bearer`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Relative lifetime.
	#[serde(default, with = "crate::wire::duration::option_seconds")]
	pub expires_in: Option<Duration>,
	/// Absolute expiry, used when `expires_in` is missing.
	#[serde(default, with = "crate::wire::timestamp::option")]
	pub expire_time: Option<OffsetDateTime>,
	/// Device the session is bound to.
	pub device_id: DeviceId,
	/// User the session belongs to.
	pub user_id: UserId,
}
impl TokenResponse {
	/// Decodes a token-endpoint body.
	pub fn decode(body: &[u8]) -> Result<Self, ParseError> {
		wire::from_slice("token response", body)
	}

	/// Turns the response into an [`AccessSession`] minted at `now`.
	///
	/// `current_refresh` is carried over when the response does not rotate the refresh token.
	pub fn into_session(
		self,
		current_refresh: &TokenSecret,
		now: OffsetDateTime,
	) -> Result<AccessSession, ParseError> {
		let expire_at = match (self.expires_in, self.expire_time) {
			(Some(lifetime), _) => {
				if lifetime.is_negative() {
					return Err(ParseError::ExpiresInOutOfRange);
				}

				now.checked_add(lifetime).ok_or(ParseError::ExpiresInOutOfRange)?
			},
			(None, Some(instant)) => instant,
			(None, None) => return Err(ParseError::MissingExpiry),
		};

		Ok(AccessSession {
			access_token: self.access_token,
			refresh_token: self.refresh_token.unwrap_or_else(|| current_refresh.clone()),
			token_type: self.token_type,
			issued_at: now,
			expire_at,
			device_id: self.device_id,
			user_id: self.user_id,
		})
	}
}

/// Error body returned by the token endpoint on rejection.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TokenErrorBody {
	/// Machine-readable code (`InvalidParameter.RefreshToken`, `invalid_grant`, ...).
	#[serde(default, alias = "error")]
	pub code: Option<String>,
	/// Human-readable explanation.
	#[serde(default, alias = "error_description")]
	pub message: Option<String>,
}
impl TokenErrorBody {
	/// Best-effort decode; malformed bodies yield an empty value.
	pub fn decode_lossy(body: &[u8]) -> Self {
		wire::from_slice("token error", body).unwrap_or_default()
	}
}

/// Short-lived credential set produced by one refresh exchange.
///
/// Sessions are immutable. A refresh produces a new session that replaces the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessSession {
	/// Bearer token attached to every call.
	pub access_token: TokenSecret,
	/// Refresh token to use for the next exchange.
	pub refresh_token: TokenSecret,
	/// Token type label reported by the service.
	pub token_type: Option<String>,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Instant the access token stops being usable.
	pub expire_at: OffsetDateTime,
	/// Device the session is bound to.
	pub device_id: DeviceId,
	/// User the session belongs to.
	pub user_id: UserId,
}
impl AccessSession {
	/// Returns `true` once `now` reaches the expiry instant; the boundary itself counts as expired.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expire_at <= now
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		let remaining = self.expire_at - now;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2024-03-01 08:00:00 UTC);

	#[test]
	fn refresh_request_encodes_grant_as_string() {
		let secret = TokenSecret::new("R0");

		assert_eq!(
			wire::to_string(&RefreshRequest::new(&secret)).expect("Refresh body should encode."),
			r#"{"refresh_token":"R0","grant_type":"refresh_token"}"#
		);
	}

	#[test]
	fn relative_lifetime_is_anchored_at_refresh_time() {
		let response = TokenResponse::decode(
			br#"{"access_token":"A1","refresh_token":"R1","expires_in":7200,"device_id":"D1","user_id":"U1","token_type":"Bearer","avatar":""}"#,
		)
		.expect("Token response should decode.");
		let session = response
			.into_session(&TokenSecret::new("R0"), NOW)
			.expect("Session should be minted.");

		assert_eq!(session.access_token.expose(), "A1");
		assert_eq!(session.refresh_token.expose(), "R1");
		assert_eq!(session.expire_at, NOW + Duration::hours(2));
		assert_eq!(session.device_id.as_ref(), "D1");
		assert_eq!(session.user_id.as_ref(), "U1");
		assert_eq!(session.token_type.as_deref(), Some("Bearer"));
	}

	#[test]
	fn absolute_expiry_is_used_without_relative_lifetime() {
		let response = TokenResponse::decode(
			br#"{"access_token":"A1","expire_time":"2024-03-01T10:00:00.000Z","device_id":"D1","user_id":"U1"}"#,
		)
		.expect("Token response should decode.");
		let session = response
			.into_session(&TokenSecret::new("R0"), NOW)
			.expect("Session should be minted.");

		assert_eq!(session.expire_at, datetime!(2024-03-01 10:00:00 UTC));
		assert_eq!(session.refresh_token.expose(), "R0", "Refresh token should be carried over.");
	}

	#[test]
	fn missing_or_negative_lifetimes_are_rejected() {
		let missing = TokenResponse::decode(br#"{"access_token":"A1","device_id":"D1","user_id":"U1"}"#)
			.expect("Token response should decode.")
			.into_session(&TokenSecret::new("R0"), NOW)
			.expect_err("Sessions without expiry must be rejected.");

		assert!(matches!(missing, ParseError::MissingExpiry));

		let negative = TokenResponse::decode(
			br#"{"access_token":"A1","expires_in":-5,"device_id":"D1","user_id":"U1"}"#,
		)
		.expect("Token response should decode.")
		.into_session(&TokenSecret::new("R0"), NOW)
		.expect_err("Negative lifetimes must be rejected.");

		assert!(matches!(negative, ParseError::ExpiresInOutOfRange));
	}

	#[test]
	fn missing_identifiers_fail_to_decode() {
		assert!(matches!(
			TokenResponse::decode(br#"{"access_token":"A1","expires_in":60,"user_id":"U1"}"#),
			Err(ParseError::Json { .. })
		));
		assert!(matches!(
			TokenResponse::decode(br#"{"access_token":"A1","expires_in":60,"device_id":" ","user_id":"U1"}"#),
			Err(ParseError::Json { .. })
		));
	}

	#[test]
	fn expiry_boundary_counts_as_expired() {
		let session = TokenResponse::decode(
			br#"{"access_token":"A1","expires_in":60,"device_id":"D1","user_id":"U1"}"#,
		)
		.expect("Token response should decode.")
		.into_session(&TokenSecret::new("R0"), NOW)
		.expect("Session should be minted.");

		assert!(!session.is_expired_at(NOW + Duration::seconds(59)));
		assert!(session.is_expired_at(session.expire_at));
		assert!(session.is_expired_at(NOW + Duration::seconds(61)));
		assert_eq!(session.remaining_at(NOW), Duration::seconds(60));
		assert_eq!(session.remaining_at(NOW + Duration::hours(1)), Duration::ZERO);
	}

	#[test]
	fn error_body_accepts_service_and_oauth_shapes() {
		let service = TokenErrorBody::decode_lossy(
			br#"{"code":"InvalidParameter.RefreshToken","message":"refresh_token is not valid"}"#,
		);

		assert_eq!(service.code.as_deref(), Some("InvalidParameter.RefreshToken"));

		let oauth = TokenErrorBody::decode_lossy(br#"{"error":"invalid_grant"}"#);

		assert_eq!(oauth.code.as_deref(), Some("invalid_grant"));
		assert!(TokenErrorBody::decode_lossy(b"<html>").code.is_none());
	}
}

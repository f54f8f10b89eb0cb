//! Session-level error types shared by the wire codec, signer, session manager, and gateway.

// self
use crate::{_prelude::*, auth::IdentifierError, service::ServiceDescriptorError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential or request rejected by the service; never retried by this crate.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport or status failure from one of the remote endpoints.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Payload violated the wire-format contract.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns `true` when a caller-level retry with backoff may succeed.
	///
	/// Authentication, parse, and configuration failures are never retryable.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Network(NetworkError::Transport { .. }) => true,
			Self::Network(NetworkError::Status { status, .. }) =>
				*status == 429 || (500..600).contains(status),
			_ => false,
		}
	}

	/// Retry-After hint reported by the remote endpoint, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Network(NetworkError::Status { retry_after, .. }) => *retry_after,
			_ => None,
		}
	}
}

/// Remote endpoints contacted by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Token-issuance endpoint used for refresh exchanges.
	Token,
	/// Auxiliary device-signing endpoint.
	Signing,
	/// Business API reached through the gateway.
	Api,
}
impl Endpoint {
	/// Returns a stable label suitable for messages and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Token => "token",
			Endpoint::Signing => "signing",
			Endpoint::Api => "api",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Authentication failures. Retrying with the same credential cannot succeed.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint rejected the refresh credential (expired or revoked).
	#[error("Token endpoint rejected the refresh token ({status}): {}.", .message.as_deref().unwrap_or("no reason given"))]
	RefreshRejected {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Service error code, when the body carried one.
		code: Option<String>,
		/// Service error message, when the body carried one.
		message: Option<String>,
	},
	/// The service rejected a call twice in a row, including once right after a forced refresh.
	#[error("Service rejected the request after a forced session refresh ({status}).")]
	RequestRejected {
		/// HTTP status of the second rejection.
		status: u16,
	},
	/// No session has been established yet.
	#[error("No authenticated session has been established.")]
	Unauthenticated,
}

/// Transport-level and status failures. Eligible for caller-level retry; never retried here.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Underlying HTTP client failed before a response arrived (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Transport {
		/// Endpoint that was being called.
		endpoint: Endpoint,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint answered with a non-success status.
	#[error("The {endpoint} endpoint returned HTTP {status}.")]
	Status {
		/// Endpoint that was being called.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Leading part of the response body for diagnostics.
		body_preview: Option<String>,
	},
}
impl NetworkError {
	/// Wraps a transport-specific failure observed while calling `endpoint`.
	pub fn transport(endpoint: Endpoint, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { endpoint, source: Box::new(src) }
	}
}

/// Wire-format contract violations.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// Payload was not valid JSON or lacked a required field.
	#[error("Malformed {context} payload.")]
	Json {
		/// Which payload failed to decode.
		context: &'static str,
		/// Structured failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Payload carried data after the JSON document.
	#[error("Unexpected trailing data after the {context} payload.")]
	Trailing {
		/// Which payload failed to decode.
		context: &'static str,
		/// Underlying parser failure.
		#[source]
		source: serde_json::Error,
	},
	/// Value could not be encoded.
	#[error("Payload could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// Timestamp matched none of the accepted formats.
	#[error("Timestamp `{value}` is not in a recognized format.")]
	Timestamp {
		/// Raw value that failed to parse.
		value: String,
	},
	/// Signing endpoint returned no signature values.
	#[error("Signing endpoint returned an empty signature list.")]
	EmptySignature,
	/// Token response declared neither `expires_in` nor `expire_time`.
	#[error("Token response is missing expires_in and expire_time.")]
	MissingExpiry,
	/// Token response declared a lifetime outside the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Issued credential cannot be carried in an HTTP header.
	#[error("Header `{name}` would carry characters HTTP does not allow.")]
	InvalidHeaderValue {
		/// Header name.
		name: &'static str,
	},
	/// Token response carried an unusable device or user identifier.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Caller-supplied header name or value is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as supplied.
		name: String,
	},
	/// Request path could not be resolved against the API base.
	#[error("Request URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// Service descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] ServiceDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

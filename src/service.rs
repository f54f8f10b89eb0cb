//! Service descriptors: the endpoints the session layer talks to and the client identity it
//! presents.
//!
//! `builder` assembles a [`ServiceDescriptor`] and enforces HTTPS endpoints plus a header-safe
//! client canary; `identity` carries the canary itself.

pub mod builder;
pub mod identity;

pub use builder::*;
pub use identity::*;

// self
use crate::_prelude::*;

/// Default token-issuance endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://auth.aliyundrive.com/v2/account/token";
/// Default business API base.
pub const DEFAULT_API_BASE: &str = "https://api.aliyundrive.com/";

/// Endpoint set used by the session layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceEndpoints {
	/// Token endpoint used for refresh exchanges.
	pub token: Url,
	/// Auxiliary signing endpoint.
	pub signing: Url,
	/// Base URL that gateway request paths are resolved against.
	pub api_base: Url,
}

/// Immutable, validated service descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceDescriptor {
	/// Endpoint definitions.
	pub endpoints: ServiceEndpoints,
	/// Identity presented through the canary header.
	#[serde(default)]
	pub identity: ClientIdentity,
}
impl ServiceDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new()
	}

	/// Descriptor for the public drive service, signed by `signing_endpoint`.
	///
	/// The signing service is operated independently, so its location is always supplied by
	/// the caller.
	pub fn aliyundrive(signing_endpoint: Url) -> Result<Self, ServiceDescriptorError> {
		Self::builder()
			.token_endpoint(default_url(DEFAULT_TOKEN_ENDPOINT)?)
			.api_base(default_url(DEFAULT_API_BASE)?)
			.signing_endpoint(signing_endpoint)
			.build()
	}

	/// Resolves `path` against the API base.
	pub fn api_url(&self, path: &str) -> Result<Url, url::ParseError> {
		self.endpoints.api_base.join(path.trim_start_matches('/'))
	}
}

fn default_url(raw: &'static str) -> Result<Url, ServiceDescriptorError> {
	Url::parse(raw).map_err(|_| ServiceDescriptorError::InvalidEndpoint { endpoint: raw })
}

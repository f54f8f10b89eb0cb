//! Descriptor builder plus the validation rules every [`ServiceDescriptor`] must satisfy.

// self
use crate::{
	_prelude::*,
	service::{ClientIdentity, ServiceDescriptor, ServiceEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ServiceDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Signing endpoint is mandatory.
	#[error("Missing signing endpoint.")]
	MissingSigningEndpoint,
	/// API base is mandatory.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// A built-in endpoint failed to parse.
	#[error("Built-in endpoint `{endpoint}` is not a valid URL.")]
	InvalidEndpoint {
		/// Offending literal.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS unless they point at the local machine.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The canary must be a non-empty, header-safe string.
	#[error("Client canary must be a non-empty printable ASCII string.")]
	InvalidCanary,
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug, Default)]
pub struct ServiceDescriptorBuilder {
	/// Token endpoint used for refresh exchanges.
	pub token_endpoint: Option<Url>,
	/// Auxiliary signing endpoint.
	pub signing_endpoint: Option<Url>,
	/// Base URL for gateway requests.
	pub api_base: Option<Url>,
	/// Identity presented through the canary header.
	pub identity: ClientIdentity,
}
impl ServiceDescriptorBuilder {
	/// Creates an empty builder with the default client identity.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the signing endpoint.
	pub fn signing_endpoint(mut self, url: Url) -> Self {
		self.signing_endpoint = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the client identity.
	pub fn identity(mut self, identity: ClientIdentity) -> Self {
		self.identity = identity;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		let token = self.token_endpoint.ok_or(ServiceDescriptorError::MissingTokenEndpoint)?;
		let signing =
			self.signing_endpoint.ok_or(ServiceDescriptorError::MissingSigningEndpoint)?;
		let api_base = self.api_base.ok_or(ServiceDescriptorError::MissingApiBase)?;
		let descriptor = ServiceDescriptor {
			endpoints: ServiceEndpoints { token, signing, api_base },
			identity: self.identity,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ServiceDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ServiceDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("signing", &self.endpoints.signing)?;
		validate_endpoint("api", &self.endpoints.api_base)?;
		validate_canary(self.identity.canary())?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ServiceDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ServiceDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn validate_canary(canary: &str) -> Result<(), ServiceDescriptorError> {
	if canary.is_empty() || !canary.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
		Err(ServiceDescriptorError::InvalidCanary)
	} else {
		Ok(())
	}
}

//! Client identity advertised through the `x-canary` header.

// self
use crate::_prelude::*;

/// Fixed client-identity marker sent with every authenticated call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity {
	canary: String,
}
impl ClientIdentity {
	/// Canary presented by the web client.
	pub const DEFAULT_CANARY: &'static str = "client=web,app=adrive,version=v4.0.0";

	/// Creates an identity with a custom canary string; validated by the descriptor builder.
	pub fn new(canary: impl Into<String>) -> Self {
		Self { canary: canary.into() }
	}

	/// Returns the canary header value.
	pub fn canary(&self) -> &str {
		&self.canary
	}
}
impl Default for ClientIdentity {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CANARY)
	}
}

//! Device signatures issued by the auxiliary signing service.

// self
use crate::{_prelude::*, error::ParseError, wire};

/// Proof-of-device values returned by the signing service.
///
/// A signature is only meaningful for the session it was requested with; the session manager
/// keeps the two in one snapshot so they are always replaced together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeviceSignature {
	/// Ordered signature values; the first one is sent as `x-signature`.
	#[serde(rename = "sign")]
	pub signature_values: Vec<String>,
}
impl DeviceSignature {
	/// Decodes a signing-service body, rejecting empty value lists.
	pub fn decode(body: &[u8]) -> Result<Self, ParseError> {
		let signature: Self = wire::from_slice("signature response", body)?;

		match signature.signature_values.first() {
			Some(value) if !value.is_empty() => Ok(signature),
			_ => Err(ParseError::EmptySignature),
		}
	}

	/// The value attached to outgoing requests.
	pub fn primary(&self) -> &str {
		self.signature_values.first().map(String::as_str).unwrap_or_default()
	}
}
impl Debug for DeviceSignature {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DeviceSignature")
			.field("signature_values", &format_args!("<{} redacted>", self.signature_values.len()))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn first_value_is_primary() {
		let signature = DeviceSignature::decode(br#"{"sign":["S1","S2"]}"#)
			.expect("Signature response should decode.");

		assert_eq!(signature.primary(), "S1");
		assert_eq!(signature.signature_values.len(), 2);
		assert_eq!(format!("{signature:?}"), "DeviceSignature { signature_values: <2 redacted> }");
	}

	#[test]
	fn empty_or_missing_values_are_parse_errors() {
		assert!(matches!(DeviceSignature::decode(br#"{"sign":[]}"#), Err(ParseError::EmptySignature)));
		assert!(matches!(DeviceSignature::decode(br#"{"sign":[""]}"#), Err(ParseError::EmptySignature)));
		assert!(matches!(DeviceSignature::decode(br#"{}"#), Err(ParseError::Json { .. })));
		assert!(matches!(DeviceSignature::decode(b"not json"), Err(ParseError::Json { .. })));
	}
}

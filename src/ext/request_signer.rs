//! Request signing contracts that attach a session's header set to arbitrary HTTP requests.

// self
use crate::{_prelude::*, auth::OutgoingHeaderSet, http::HttpRequest};

/// Describes how to attach an [`OutgoingHeaderSet`] to an outbound request without
/// constraining the HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects the session headers, replacing same-named
	/// headers the caller set.
	fn attach_headers(&self, request: Request, headers: &OutgoingHeaderSet)
	-> Result<Request, Error>;
}

/// Signer that copies every header of the set onto the request.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderSetSigner;
impl RequestSignerExt<HttpRequest, Error> for HeaderSetSigner {
	fn attach_headers(
		&self,
		mut request: HttpRequest,
		headers: &OutgoingHeaderSet,
	) -> Result<HttpRequest, Error> {
		headers.apply_to(request.headers_mut());

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, Error> for HeaderSetSigner {
	fn attach_headers(
		&self,
		request: reqwest::RequestBuilder,
		headers: &OutgoingHeaderSet,
	) -> Result<reqwest::RequestBuilder, Error> {
		Ok(request.headers(headers.as_header_map().clone()))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use ::http::{HeaderValue, header::AUTHORIZATION};
	use time::macros::datetime;
	// self
	use super::*;
	use crate::{
		auth::{AccessSession, DeviceId, DeviceSignature, TokenSecret, UserId},
		service::ClientIdentity,
	};

	fn headers() -> OutgoingHeaderSet {
		let session = AccessSession {
			access_token: TokenSecret::new("A1"),
			refresh_token: TokenSecret::new("R1"),
			token_type: None,
			issued_at: datetime!(2024-03-01 08:00:00 UTC),
			expire_at: datetime!(2024-03-01 10:00:00 UTC),
			device_id: DeviceId::new("D1").expect("Device fixture should be valid."),
			user_id: UserId::new("U1").expect("User fixture should be valid."),
		};
		let signature = DeviceSignature { signature_values: vec!["S1".into()] };

		OutgoingHeaderSet::build(&session, &signature, &ClientIdentity::default())
			.expect("Header set should build.")
	}

	#[test]
	fn http_requests_receive_session_headers() {
		let request = ::http::Request::builder()
			.uri("https://api.example.com/adrive/v3/file/list")
			.header(AUTHORIZATION, HeaderValue::from_static("Bearer caller"))
			.header("x-request-id", "r-1")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let signed = HeaderSetSigner
			.attach_headers(request, &headers())
			.expect("Attaching headers should succeed.");

		assert_eq!(signed.headers().get(AUTHORIZATION), Some(&HeaderValue::from_static("Bearer A1")));
		assert_eq!(signed.headers().get("x-signature"), Some(&HeaderValue::from_static("S1")));
		assert_eq!(signed.headers().get("x-request-id"), Some(&HeaderValue::from_static("r-1")));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_builders_receive_session_headers() {
		let builder = ReqwestClient::new().get("https://api.example.com/adrive/v2/user/get");
		let request = HeaderSetSigner
			.attach_headers(builder, &headers())
			.expect("Attaching headers should succeed.")
			.build()
			.expect("Signed request should build.");

		assert_eq!(request.headers().get("x-device-id"), Some(&HeaderValue::from_static("D1")));
		assert_eq!(
			request.headers().get("x-canary"),
			Some(&HeaderValue::from_static(ClientIdentity::DEFAULT_CANARY))
		);
	}
}

//! Client for the auxiliary signing service that issues per-device signatures.
//!
//! The signing service is operated independently from the drive service. Its failures are
//! never retried here: a missing signature aborts session establishment the same way a
//! rejected refresh token does.

// crates.io
use ::http::Method;
// self
use crate::{
	_prelude::*,
	auth::{DeviceId, DeviceSignature, TokenSecret, UserId},
	error::Endpoint,
	http::{self as transport, AuthHttpClient, TransportErrorMapper},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Fetches device signatures from a fixed signing endpoint.
pub struct SignatureFetcher<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	endpoint: Url,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> SignatureFetcher<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a fetcher for `endpoint` sharing the caller's transport.
	pub fn new(endpoint: Url, http_client: Arc<C>, transport_mapper: Arc<M>) -> Self {
		Self { endpoint, http_client, transport_mapper }
	}

	/// Signing endpoint this fetcher calls.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Requests a signature bound to `device_id`, `user_id`, and `access_token`.
	///
	/// Issues exactly one unauthenticated GET. Non-success statuses surface as
	/// [`NetworkError`](crate::error::NetworkError) and malformed bodies as
	/// [`ParseError`](crate::error::ParseError).
	pub async fn fetch_signature(
		&self,
		device_id: &DeviceId,
		user_id: &UserId,
		access_token: &TokenSecret,
	) -> Result<DeviceSignature> {
		const KIND: OpKind = OpKind::Sign;

		let span = OpSpan::new(KIND, "fetch_signature");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result: Result<DeviceSignature> = span
			.instrument(async move {
				let url = self.signing_url(device_id, user_id, access_token);
				let request = transport::empty_request(Method::GET, &url)?;
				let response = transport::dispatch(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					Endpoint::Signing,
					request,
				)
				.await?;

				if !response.status().is_success() {
					return Err(transport::status_error(Endpoint::Signing, &response).into());
				}

				Ok(DeviceSignature::decode(response.body())?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	fn signing_url(&self, device_id: &DeviceId, user_id: &UserId, access_token: &TokenSecret) -> Url {
		let mut url = self.endpoint.clone();

		url.query_pairs_mut()
			.append_pair("userid", user_id)
			.append_pair("deviceid", device_id)
			.append_pair("jwt", access_token.expose());

		url
	}
}
impl<C, M> Debug for SignatureFetcher<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignatureFetcher").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

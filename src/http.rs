//! Transport primitives for the token, signing, and API endpoints.
//!
//! The module exposes [`AuthHttpClient`], the crate's only dependency on an HTTP stack, and
//! [`TransportErrorMapper`], which classifies a transport's native errors into the crate
//! taxonomy. Requests and responses travel as plain [`::http`] values so custom clients need
//! no adapter types. A reqwest-backed implementation ships behind the default `reqwest`
//! feature.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::{HeaderMap, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, Endpoint, NetworkError},
};

/// Request shape accepted by [`AuthHttpClient`].
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Response shape produced by [`AuthHttpClient`].
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`AuthHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

const BODY_PREVIEW_LEN: usize = 256;

/// Abstraction over HTTP transports used for every outbound call.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// session manager, the signature fetcher, and the gateway behind an `Arc`. Non-success
/// statuses are not errors at this layer; the callers classify them.
pub trait AuthHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the full response.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Maps transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts a failure observed while calling `endpoint`.
	fn map_transport_error(&self, endpoint: Endpoint, error: E) -> Error;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AuthHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(reqwest::Request::try_from(request)?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut converted = HttpResponse::new(response.bytes().await?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, endpoint: Endpoint, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}

		NetworkError::transport(endpoint, err).into()
	}
}

/// Sends `request` through `client`, classifying transport failures with `mapper`.
pub(crate) async fn dispatch<C, M>(
	client: &C,
	mapper: &M,
	endpoint: Endpoint,
	request: HttpRequest,
) -> Result<HttpResponse>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client.execute(request).await.map_err(|err| mapper.map_transport_error(endpoint, err))
}

/// Builds a [`NetworkError::Status`] describing a non-success `response`.
pub(crate) fn status_error(endpoint: Endpoint, response: &HttpResponse) -> NetworkError {
	let body = response.body();
	let body_preview = (!body.is_empty()).then(|| {
		let end = body.len().min(BODY_PREVIEW_LEN);

		String::from_utf8_lossy(&body[..end]).into_owned()
	});

	NetworkError::Status {
		endpoint,
		status: response.status().as_u16(),
		retry_after: parse_retry_after(response.headers(), OffsetDateTime::now_utc()),
		body_preview,
	}
}

/// Reads a `Retry-After` header expressed either as seconds or as an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Builds a request with no body.
pub(crate) fn empty_request(method: ::http::Method, url: &Url) -> Result<HttpRequest> {
	::http::Request::builder()
		.method(method)
		.uri(url.as_str())
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

//! Authenticated request gateway.
//!
//! [`Gateway`] is the single path for business API calls: it asks the [`SessionManager`] for
//! a live snapshot, merges the snapshot's header set onto the request, and sends it through
//! the manager's transport. A `401` from the service means the service no longer accepts a
//! session the manager still believes valid; the gateway then forces one refresh for the
//! generation it used and retries once.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::OutgoingHeaderSet,
	error::{AuthError, ConfigError, Endpoint},
	ext::{HeaderSetSigner, RequestSignerExt},
	http::{self as transport, AuthHttpClient, HttpRequest, HttpResponse, TransportErrorMapper},
	obs::{self, OpKind, OpOutcome, OpSpan},
	service::ServiceDescriptor,
	session::SessionManager,
	wire,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
	Path(String),
	Url(Url),
}

/// Business API call awaiting authentication.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	target: Target,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiRequest {
	/// Creates a request for `path`, resolved against the descriptor's API base when sent.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			target: Target::Path(path.into()),
			headers: HeaderMap::new(),
			body: Vec::new(),
		}
	}

	/// Creates a request for an absolute URL, bypassing the API base.
	pub fn absolute(method: Method, url: Url) -> Self {
		Self { method, target: Target::Url(url), headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Shorthand for a `GET` to `path`.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` to `path`.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Adds a call-specific header. Session headers win over same-named call headers.
	pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
		let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		self.headers.insert(header_name, header_value);

		Ok(self)
	}

	/// Replaces the body with raw bytes.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Encodes `body` with the wire codec and marks the request as JSON.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = wire::to_vec(body)?;
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// HTTP method of the call.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Call-specific headers, before session headers are merged.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Resolves the target URL against `descriptor`.
	pub fn url(&self, descriptor: &ServiceDescriptor) -> Result<Url> {
		match &self.target {
			Target::Path(path) => Ok(descriptor.api_url(path).map_err(ConfigError::from)?),
			Target::Url(url) => Ok(url.clone()),
		}
	}

	/// Builds the signed transport request for `url`.
	fn to_http(&self, url: &Url, headers: &OutgoingHeaderSet) -> Result<HttpRequest> {
		let mut request = ::http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone())
			.map_err(ConfigError::from)?;

		*request.headers_mut() = self.headers.clone();

		HeaderSetSigner.attach_headers(request, headers)
	}
}

/// Sends business API calls under the session owned by a [`SessionManager`].
pub struct Gateway<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	session: Arc<SessionManager<C, M>>,
}
impl<C, M> Gateway<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a shared session manager.
	pub fn new(session: Arc<SessionManager<C, M>>) -> Self {
		Self { session }
	}

	/// Session manager backing this gateway.
	pub fn session(&self) -> &Arc<SessionManager<C, M>> {
		&self.session
	}

	/// Sends `request` with the current session headers.
	///
	/// Statuses other than `401` are returned untouched, including other failures. A `401`
	/// triggers one refresh and one retry; a second `401` surfaces as
	/// [`AuthError::RequestRejected`].
	pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result: Result<HttpResponse> = span
			.instrument(async {
				let url = request.url(self.session.descriptor())?;
				let snapshot = self.session.ensure_valid_snapshot().await?;
				let response = self.dispatch(request.to_http(&url, &snapshot.headers)?).await?;

				if response.status() != StatusCode::UNAUTHORIZED {
					return Ok(response);
				}

				obs::request_rejected(snapshot.generation, response.status().as_u16());

				let refreshed = self.session.refresh_if_generation(snapshot.generation).await?;
				let retried = self.dispatch(request.to_http(&url, &refreshed.headers)?).await?;

				if retried.status() == StatusCode::UNAUTHORIZED {
					let status = retried.status().as_u16();

					return Err(AuthError::RequestRejected { status }.into());
				}

				Ok(retried)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Posts `body` as JSON to `path` and decodes the JSON response.
	///
	/// Non-success statuses surface as [`NetworkError::Status`](crate::error::NetworkError).
	pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
	where
		Req: ?Sized + Serialize,
		Resp: DeserializeOwned,
	{
		let response = self.send(ApiRequest::post(path).json(body)?).await?;

		if !response.status().is_success() {
			return Err(transport::status_error(Endpoint::Api, &response).into());
		}

		Ok(wire::from_slice("api response", response.body())?)
	}

	async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse> {
		transport::dispatch(
			self.session.http_client().as_ref(),
			self.session.transport_mapper().as_ref(),
			Endpoint::Api,
			request,
		)
		.await
	}
}
impl<C, M> Clone for Gateway<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { session: self.session.clone() }
	}
}
impl<C, M> Debug for Gateway<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway").field("session", &self.session).finish()
	}
}

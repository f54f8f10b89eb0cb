//! Session lifecycle with single-flight rotation and atomic snapshot publication.
//!
//! [`SessionManager`] owns the refresh credential and the current [`SessionSnapshot`]. Every
//! authenticated call goes through [`SessionManager::ensure_valid_session`], which reuses the
//! published snapshot while it is live and otherwise performs one rotation:
//! `grant_type=refresh_token` exchange, credential rotation, signature fetch, header rebuild,
//! publish. Rotations are serialized by an async lock, and callers that were waiting on it
//! re-check the published generation before doing any work, so an expiry event triggers at
//! most one rotation regardless of how many callers observed it.
//!
//! The snapshot is swapped with a single synchronous write once every await has completed.
//! A failed or cancelled rotation therefore leaves the previous snapshot in place. The refresh
//! credential is the exception: it is replaced as soon as the token endpoint answers, because
//! the service has already retired the old value at that point.

mod clock;
mod metrics;

pub use clock::*;
pub use metrics::SessionMetrics;

// crates.io
use ::http::{
	Method,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessSession, DeviceSignature, OutgoingHeaderSet, RefreshRequest, TokenErrorBody,
		TokenResponse, TokenSecret,
	},
	error::{AuthError, ConfigError, Endpoint},
	http::{self as transport, AuthHttpClient, TransportErrorMapper},
	obs::{self, OpKind, OpOutcome, OpSpan},
	service::{ServiceDescriptor, ServiceDescriptorError},
	signer::SignatureFetcher,
	wire,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Session manager specialized for the crate's default reqwest transport stack.
pub type ReqwestSessionManager = SessionManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Everything produced by one rotation, published as a unit.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
	/// Rotation counter; starts at 1 and grows by one per successful rotation.
	pub generation: u64,
	/// Access session minted by the rotation.
	pub session: AccessSession,
	/// Signature requested with `session`.
	pub signature: DeviceSignature,
	/// Headers derived from `session` and `signature`.
	pub headers: OutgoingHeaderSet,
}

/// Coarse lifecycle state at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	/// No rotation has succeeded yet.
	Unauthenticated,
	/// The published session is live.
	Authenticated {
		/// Generation of the live snapshot.
		generation: u64,
		/// Expiry of the live session.
		expire_at: OffsetDateTime,
	},
	/// The published session reached its expiry; the next call rotates.
	Expired {
		/// Generation of the stale snapshot.
		generation: u64,
	},
}

/// Owns the refresh credential and the current session snapshot.
pub struct SessionManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: ServiceDescriptor,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	signer: SignatureFetcher<C, M>,
	clock: Arc<dyn Clock>,
	refresh_token: RwLock<TokenSecret>,
	current: RwLock<Option<Arc<SessionSnapshot>>>,
	rotation_guard: AsyncMutex<()>,
	metrics: SessionMetrics,
}
impl<C, M> SessionManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport + mapper pair.
	///
	/// Fails when `descriptor` does not pass [`ServiceDescriptor::validate`].
	pub fn with_http_client(
		refresh_token: impl Into<TokenSecret>,
		descriptor: ServiceDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self, ServiceDescriptorError> {
		descriptor.validate()?;

		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let signer = SignatureFetcher::new(
			descriptor.endpoints.signing.clone(),
			http_client.clone(),
			transport_mapper.clone(),
		);

		Ok(Self {
			descriptor,
			http_client,
			transport_mapper,
			signer,
			clock: Arc::new(SystemClock),
			refresh_token: RwLock::new(refresh_token.into()),
			current: Default::default(),
			rotation_guard: Default::default(),
			metrics: Default::default(),
		})
	}

	/// Replaces the clock used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Service descriptor this manager authenticates against.
	pub fn descriptor(&self) -> &ServiceDescriptor {
		&self.descriptor
	}

	/// Rotation counters.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.metrics
	}

	/// Current refresh credential, so callers can persist it after rotations.
	pub fn refresh_credential(&self) -> TokenSecret {
		self.refresh_token.read().clone()
	}

	/// Latest published snapshot, live or not.
	pub fn snapshot(&self) -> Option<Arc<SessionSnapshot>> {
		self.current.read().clone()
	}

	/// Latest published access session, live or not.
	pub fn current_session(&self) -> Option<AccessSession> {
		self.current.read().as_ref().map(|snapshot| snapshot.session.clone())
	}

	/// Generation of the latest published snapshot, or 0 before the first rotation.
	pub fn generation(&self) -> u64 {
		self.current.read().as_ref().map_or(0, |snapshot| snapshot.generation)
	}

	/// Lifecycle state according to the configured clock.
	pub fn state(&self) -> SessionState {
		match self.snapshot() {
			None => SessionState::Unauthenticated,
			Some(snapshot) if snapshot.session.is_expired_at(self.clock.now()) =>
				SessionState::Expired { generation: snapshot.generation },
			Some(snapshot) => SessionState::Authenticated {
				generation: snapshot.generation,
				expire_at: snapshot.session.expire_at,
			},
		}
	}

	/// Headers established by the most recent successful rotation.
	///
	/// Fails with [`AuthError::Unauthenticated`] until a rotation has succeeded. The returned
	/// headers may belong to an expired session; call
	/// [`ensure_valid_session`](Self::ensure_valid_session) before issuing requests.
	pub fn current_headers(&self) -> Result<OutgoingHeaderSet> {
		self.current
			.read()
			.as_ref()
			.map(|snapshot| snapshot.headers.clone())
			.ok_or_else(|| AuthError::Unauthenticated.into())
	}

	/// Makes sure a live session exists and returns its headers.
	///
	/// Rotates when no session exists or the current one has reached its expiry. Otherwise
	/// the published headers are returned without any network traffic.
	pub async fn ensure_valid_session(&self) -> Result<OutgoingHeaderSet> {
		Ok(self.ensure_valid_snapshot().await?.headers.clone())
	}

	/// Same as [`ensure_valid_session`](Self::ensure_valid_session) but returns the whole snapshot.
	///
	/// A caller that waited on another caller's rotation reuses its result even when the new
	/// session is already past its expiry (zero lifetime or clock skew). One expiry event
	/// never causes more than one rotation.
	pub async fn ensure_valid_snapshot(&self) -> Result<Arc<SessionSnapshot>> {
		let observed = self.snapshot();
		let now = self.clock.now();

		if let Some(snapshot) = &observed
			&& !snapshot.session.is_expired_at(now)
		{
			return Ok(snapshot.clone());
		}

		let observed = observed.map_or(0, |snapshot| snapshot.generation);
		let _rotation = self.rotation_guard.lock().await;

		if let Some(snapshot) = self.snapshot()
			&& snapshot.generation != observed
		{
			self.metrics.record_coalesced();
			obs::session_coalesced(snapshot.generation);

			return Ok(snapshot);
		}
		if let Some(snapshot) = self.live_snapshot() {
			return Ok(snapshot);
		}

		self.rotate().await
	}

	/// Unconditionally rotates the session and returns the new access session.
	///
	/// A rejected refresh credential surfaces as [`AuthError::RefreshRejected`] and is not
	/// retried. Any failure leaves the previously published snapshot untouched.
	pub async fn refresh(&self) -> Result<AccessSession> {
		let _rotation = self.rotation_guard.lock().await;

		Ok(self.rotate().await?.session.clone())
	}

	/// Rotates unless another caller already replaced generation `generation`.
	///
	/// Used after the service rejects a session it should have accepted: every caller that
	/// saw the rejection under the same generation shares a single rotation.
	pub async fn refresh_if_generation(&self, generation: u64) -> Result<Arc<SessionSnapshot>> {
		let _rotation = self.rotation_guard.lock().await;

		if let Some(snapshot) = self.live_snapshot()
			&& snapshot.generation != generation
		{
			self.metrics.record_coalesced();
			obs::session_coalesced(snapshot.generation);

			return Ok(snapshot);
		}

		self.rotate().await
	}

	pub(crate) fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	pub(crate) fn transport_mapper(&self) -> &Arc<M> {
		&self.transport_mapper
	}

	fn live_snapshot(&self) -> Option<Arc<SessionSnapshot>> {
		let now = self.clock.now();

		self.current.read().as_ref().filter(|snapshot| !snapshot.session.is_expired_at(now)).cloned()
	}

	// Callers must hold `rotation_guard`.
	async fn rotate(&self) -> Result<Arc<SessionSnapshot>> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "rotate");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result: Result<Arc<SessionSnapshot>> = span
			.instrument(async {
				let refresh_token = self.refresh_credential();
				let session = self.exchange(&refresh_token).await?;

				*self.refresh_token.write() = session.refresh_token.clone();

				self.metrics.record_signature_fetch();

				let signature = self
					.signer
					.fetch_signature(&session.device_id, &session.user_id, &session.access_token)
					.await?;
				let headers =
					OutgoingHeaderSet::build(&session, &signature, &self.descriptor.identity)?;

				Ok(self.publish(session, signature, headers))
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	async fn exchange(&self, refresh_token: &TokenSecret) -> Result<AccessSession> {
		self.metrics.record_refresh();

		let body = wire::to_vec(&RefreshRequest::new(refresh_token))?;
		let request = ::http::Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.map_err(ConfigError::from)?;
		let response = transport::dispatch(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			Endpoint::Token,
			request,
		)
		.await?;
		let status = response.status().as_u16();

		if matches!(status, 400 | 401 | 403) {
			let TokenErrorBody { code, message } = TokenErrorBody::decode_lossy(response.body());

			return Err(AuthError::RefreshRejected { status, code, message }.into());
		}
		if !response.status().is_success() {
			return Err(transport::status_error(Endpoint::Token, &response).into());
		}

		let session =
			TokenResponse::decode(response.body())?.into_session(refresh_token, self.clock.now())?;

		Ok(session)
	}

	fn publish(
		&self,
		session: AccessSession,
		signature: DeviceSignature,
		headers: OutgoingHeaderSet,
	) -> Arc<SessionSnapshot> {
		let mut current = self.current.write();
		let generation = current.as_ref().map_or(0, |snapshot| snapshot.generation) + 1;
		let snapshot = Arc::new(SessionSnapshot { generation, session, signature, headers });

		obs::session_rotated(generation, &snapshot.session.device_id, snapshot.session.expire_at);

		*current = Some(snapshot.clone());

		snapshot
	}
}
#[cfg(feature = "reqwest")]
impl SessionManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager backed by its own reqwest transport.
	pub fn new(
		refresh_token: impl Into<TokenSecret>,
		descriptor: ServiceDescriptor,
	) -> Result<Self, ServiceDescriptorError> {
		Self::with_http_client(
			refresh_token,
			descriptor,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Debug for SessionManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("descriptor", &self.descriptor)
			.field("generation", &self.generation())
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

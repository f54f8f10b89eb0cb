//! Session lifecycle for the Aliyun Drive API: refresh-token rotation, device signatures,
//! and single-flight header sets applied to every authenticated call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod ext;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod service;
pub mod session;
pub mod signer;
pub mod wire;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		gateway::Gateway,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		service::{ClientIdentity, ServiceDescriptor},
		session::{Clock, SessionManager},
	};

	/// Session manager type alias used by reqwest-backed integration tests.
	pub type ReqwestTestManager = SessionManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a descriptor whose token, signing, and API endpoints all live on the mock server
	/// rooted at `base` (for example `httpmock::MockServer::base_url`).
	pub fn mock_descriptor(base: &str) -> ServiceDescriptor {
		let url = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Mock endpoint URL should parse.")
		};

		ServiceDescriptor::builder()
			.token_endpoint(url("/v2/account/token"))
			.signing_endpoint(url("/alisign"))
			.api_base(url("/"))
			.identity(ClientIdentity::default())
			.build()
			.expect("Mock service descriptor should build successfully.")
	}

	/// Constructs a [`SessionManager`] seeded with `refresh_token` and the reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_manager(
		descriptor: ServiceDescriptor,
		refresh_token: &str,
	) -> Arc<ReqwestTestManager> {
		Arc::new(
			SessionManager::with_http_client(
				refresh_token,
				descriptor,
				test_reqwest_http_client(),
				ReqwestTransportErrorMapper,
			)
			.expect("Test descriptor should validate."),
		)
	}

	/// Same as [`build_reqwest_test_manager`] but driven by the provided clock.
	pub fn build_reqwest_test_manager_with_clock(
		descriptor: ServiceDescriptor,
		refresh_token: &str,
		clock: Arc<dyn Clock>,
	) -> Arc<ReqwestTestManager> {
		Arc::new(
			SessionManager::with_http_client(
				refresh_token,
				descriptor,
				test_reqwest_http_client(),
				ReqwestTransportErrorMapper,
			)
			.expect("Test descriptor should validate.")
			.with_clock(clock),
		)
	}

	/// Clock that only moves when told to.
	#[derive(Debug)]
	pub struct ManualClock(Mutex<OffsetDateTime>);
	impl ManualClock {
		/// Starts the clock at `start`.
		pub fn new(start: OffsetDateTime) -> Self {
			Self(Mutex::new(start))
		}

		/// Moves the clock forward by `delta`.
		pub fn advance(&self, delta: Duration) {
			*self.0.lock() += delta;
		}

		/// Pins the clock to `instant`.
		pub fn set(&self, instant: OffsetDateTime) {
			*self.0.lock() = instant;
		}
	}
	impl Clock for ManualClock {
		fn now(&self) -> OffsetDateTime {
			*self.0.lock()
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};

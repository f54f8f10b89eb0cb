// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session rotations.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	refreshes: AtomicU64,
	signature_fetches: AtomicU64,
	coalesced: AtomicU64,
	failures: AtomicU64,
}
impl SessionMetrics {
	/// Returns the number of refresh exchanges sent to the token endpoint.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of signature requests sent to the signing endpoint.
	pub fn signature_fetches(&self) -> u64 {
		self.signature_fetches.load(Ordering::Relaxed)
	}

	/// Returns how often a caller waited on the rotation lock and reused another caller's result.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Returns the number of rotations that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_signature_fetch(&self) {
		self.signature_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

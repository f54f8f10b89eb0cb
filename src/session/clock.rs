//! Time source used for expiry decisions.

// self
use crate::_prelude::*;

/// Clock abstraction so expiry checks can be driven deterministically in tests.
pub trait Clock: Send + Sync {
	/// Current instant in UTC.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

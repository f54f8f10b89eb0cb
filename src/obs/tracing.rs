// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by session operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("adrive_auth.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Emits a rotation event; compiled out without the `tracing` feature.
pub(crate) fn session_rotated(generation: u64, device_id: &str, expire_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(generation, device_id, %expire_at, "Session rotated.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (generation, device_id, expire_at);
	}
}

/// Emits a debug event when a caller reuses a rotation another caller just finished.
pub(crate) fn session_coalesced(generation: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(generation, "Reused session rotated by a concurrent caller.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = generation;
	}
}

/// Emits a warning when the service rejects a request the local session considered valid.
pub(crate) fn request_rejected(generation: u64, status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(generation, status, "Service rejected the session; forcing one refresh.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (generation, status);
	}
}

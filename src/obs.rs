//! Optional observability helpers for the authentication flow.
//!
//! Enable the `tracing` feature to emit structured spans named `yahoo_strategy.flow`
//! with a `stage` field per flow leg; without the feature everything compiles to no-ops.

// self
use crate::_prelude::*;

/// Stages of a single authentication pass, one per collaborator operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthStage {
	/// Storing anti-forgery state ahead of the authorization redirect.
	StateStore,
	/// Verifying the inbound anti-forgery state.
	StateVerify,
	/// Exchanging the authorization code for tokens.
	Exchange,
	/// Fetching and mapping the user profile.
	Profile,
	/// Invoking the caller-supplied verifier.
	Verify,
}
impl AuthStage {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthStage::StateStore => "state_store",
			AuthStage::StateVerify => "state_verify",
			AuthStage::Exchange => "exchange",
			AuthStage::Profile => "profile",
			AuthStage::Verify => "verify",
		}
	}
}
impl Display for AuthStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by the flow controller.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: AuthStage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("yahoo_strategy.flow", stage = stage.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_is_transparent() {
		let span = FlowSpan::new(AuthStage::Exchange);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn stage_labels_are_stable() {
		assert_eq!(AuthStage::StateStore.as_str(), "state_store");
		assert_eq!(AuthStage::StateVerify.as_str(), "state_verify");
		assert_eq!(AuthStage::Profile.to_string(), "profile");
	}
}

//! Anti-forgery state contracts consumed by the flow controller.
//!
//! The strategy never persists state itself; it delegates generation and single-use
//! verification to a [`StateStore`]. [`MemoryStateStore`] is the in-process reference
//! implementation used by tests and demos.

pub mod memory;

pub use memory::MemoryStateStore;

// self
use crate::{_prelude::*, flow::AuthRequest};

/// Boxed future returned by [`StateStore`] operations.
pub type StateStoreFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, StateStoreError>> + 'a + Send>>;

/// Correlation metadata handed to the state store for diagnostics and auditing only.
///
/// Stores must not derive behavior from these fields; they identify which strategy
/// instance issued the state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMeta {
	/// Authorization endpoint the user is redirected to.
	pub authorization_url: Url,
	/// Token endpoint used for the code exchange.
	pub token_url: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
}

/// Outcome of verifying an inbound `state` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVerification {
	/// Whether the state matched one issued for this flow.
	pub ok: bool,
	/// Correlation payload the store associated with the state, if any. Returned to the
	/// caller on success, or attached to the failure detail on rejection.
	pub state: Option<Json>,
}
impl StateVerification {
	/// Shorthand for an accepted state without a payload.
	pub fn accepted() -> Self {
		Self { ok: true, state: None }
	}

	/// Shorthand for a rejected state without a payload.
	pub fn rejected() -> Self {
		Self { ok: false, state: None }
	}
}

/// Anti-forgery state backend contract.
///
/// Both operations receive the inbound request and the correlation [`StateMeta`];
/// implementations that do not need either simply ignore them.
pub trait StateStore
where
	Self: Send + Sync,
{
	/// Generates and records a state token for an outbound authorization redirect.
	fn store<'a>(
		&'a self,
		request: &'a AuthRequest,
		meta: &'a StateMeta,
	) -> StateStoreFuture<'a, String>;

	/// Verifies the state returned on the callback; a missing parameter is a rejection,
	/// not an error.
	fn verify<'a>(
		&'a self,
		request: &'a AuthRequest,
		state: Option<&'a str>,
		meta: &'a StateMeta,
	) -> StateStoreFuture<'a, StateVerification>;
}

/// Error type produced by [`StateStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StateStoreError {
	/// State could not be generated or recorded.
	#[error("State could not be stored: {message}.")]
	Store {
		/// Human-readable error payload.
		message: String,
	},
	/// Verification failed structurally (backend unavailable, corrupt record).
	#[error("State could not be verified: {message}.")]
	Verify {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn state_store_error_converts_into_strategy_error_with_source() {
		let store_error = StateStoreError::Verify { message: "session unavailable".into() };
		let strategy_error: Error = store_error.clone().into();

		assert!(matches!(strategy_error, Error::Store(_)));
		assert!(strategy_error.to_string().contains("session unavailable"));

		let source = StdError::source(&strategy_error)
			.expect("Strategy error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn state_verification_can_be_serialized() {
		let verification =
			StateVerification { ok: false, state: Some(serde_json::json!({"returnTo": "/app"})) };
		let payload = serde_json::to_string(&verification)
			.expect("StateVerification should serialize to JSON.");
		let round_trip: StateVerification =
			serde_json::from_str(&payload).expect("Serialized verification should deserialize.");

		assert_eq!(round_trip, verification);
	}
}

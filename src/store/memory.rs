//! Thread-safe in-memory [`StateStore`] implementation for local development and tests.

// std
use std::collections::HashMap;
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	flow::AuthRequest,
	store::{StateMeta, StateStore, StateStoreFuture, StateVerification},
};

const STATE_LEN: usize = 32;

type StateMap = Arc<RwLock<HashMap<String, Option<Json>>>>;

/// In-process state backend issuing random single-use tokens.
///
/// Each token verifies successfully exactly once; any later or unknown token is rejected.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore(StateMap);
impl MemoryStateStore {
	/// Associates a correlation payload with a pre-seeded state token.
	///
	/// Useful in tests that need the rejection detail or the success payload to carry
	/// application data.
	pub fn seed(&self, state: impl Into<String>, payload: Option<Json>) {
		self.0.write().insert(state.into(), payload);
	}

	/// Number of outstanding (unverified) state tokens.
	pub fn outstanding(&self) -> usize {
		self.0.read().len()
	}

	fn store_now(map: StateMap) -> String {
		let state = random_state(STATE_LEN);

		map.write().insert(state.clone(), None);

		state
	}

	fn verify_now(map: StateMap, state: Option<&str>) -> StateVerification {
		let Some(state) = state else {
			return StateVerification::rejected();
		};

		match map.write().remove(state) {
			Some(payload) => StateVerification { ok: true, state: payload },
			None => StateVerification::rejected(),
		}
	}
}
impl StateStore for MemoryStateStore {
	fn store<'a>(
		&'a self,
		_request: &'a AuthRequest,
		_meta: &'a StateMeta,
	) -> StateStoreFuture<'a, String> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::store_now(map)) })
	}

	fn verify<'a>(
		&'a self,
		_request: &'a AuthRequest,
		state: Option<&'a str>,
		_meta: &'a StateMeta,
	) -> StateStoreFuture<'a, StateVerification> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::verify_now(map, state)) })
	}
}

fn random_state(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

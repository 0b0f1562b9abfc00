//! Yahoo OAuth 2.0 / OpenID Connect authentication strategy: authorization-code
//! orchestration and normalized identity profiles over a pluggable state store and verifier.
//!
//! The crate deliberately does not reimplement OAuth 2.0 token-endpoint semantics; the
//! [`oauth2`] crate handles the exchange itself. What lives here is the flow orchestration
//! (redirect, error callback, code callback) and the mapping of Yahoo's three historical
//! profile-endpoint shapes into one [`profile::Profile`] record.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(test)] use yahoo_oauth2_strategy as _;

pub mod config;
pub mod error;
pub mod flow;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod store;
pub mod verify;

#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::StrategyConfig,
		flow::YahooStrategy,
		http::ReqwestHttpClient,
		store::{MemoryStateStore, StateStore},
		verify::Verifier,
	};

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

	/// Constructs a [`YahooStrategy`] backed by an in-memory state store and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_strategy<V>(
		config: StrategyConfig,
		verifier: V,
	) -> (YahooStrategy<V>, Arc<MemoryStateStore>)
	where
		V: Verifier,
	{
		let store_backend = Arc::new(MemoryStateStore::default());
		let store: Arc<dyn StateStore> = store_backend.clone();
		let strategy =
			YahooStrategy::with_http_client(config, store, verifier, test_reqwest_http_client())
				.expect("Test strategy should build from a validated configuration.");

		(strategy, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as Json;
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;

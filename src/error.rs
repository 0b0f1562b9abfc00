//! Strategy-level error types shared across the flow, profile, and store layers.
//!
//! Only exceptional conditions live here. Recoverable authentication rejections
//! (denied consent, forged state, a verifier that declines the user) are reported through
//! [`AuthOutcome::Failure`](crate::flow::AuthOutcome) instead, so hosts can re-prompt
//! without treating them as server faults.

// self
use crate::_prelude::*;

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error type used at the verifier and transport seams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// State-store failure while storing or verifying anti-forgery state.
	#[error("State store failed: {0}")]
	Store(#[from] crate::store::StateStoreError),
	/// Authorization endpoint reported an error other than denied consent.
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// Authorization-code exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Profile fetch or mapping failed.
	#[error(transparent)]
	Profile(#[from] ProfileError),
	/// Caller-supplied verifier returned an error.
	#[error("Verify callback failed.")]
	Verify {
		/// Error propagated by the verifier.
		#[source]
		source: BoxError,
	},
}

/// Error reported by the provider on the authorization callback
/// (`error`/`error_description`/`error_uri` query parameters).
///
/// `access_denied` never reaches this type; denied consent is a non-fatal failure.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Authorization endpoint returned an error: {error}.")]
pub struct AuthorizationError {
	/// OAuth error code reported by the provider.
	pub error: String,
	/// Human-readable description, when supplied.
	pub description: Option<String>,
	/// URI pointing at provider documentation for the error, when supplied.
	pub uri: Option<String>,
}

/// Configuration and validation failures raised while building or running the strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Client identifier must not be empty.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Endpoint URL failed validation.
	#[error("The {endpoint} endpoint URL is invalid: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL string.
		url: String,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL string.
		url: String,
	},
	/// Callback URL could not be parsed into an absolute URL.
	#[error("Callback URL is invalid.")]
	InvalidCallback {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Relative callback URLs need the originating request URL to resolve against.
	#[error("Relative callback URL requires the original request URL.")]
	RelativeCallbackWithoutBase,
	/// Profile URL template produced an unparseable URL.
	#[error("Profile URL template produced an invalid URL: {url}.")]
	InvalidProfileUrl {
		/// URL string after placeholder substitution.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Reject scope separators that are control characters.
	#[error("Scope separator must be a printable character.")]
	InvalidScopeSeparator {
		/// Invalid separator that was supplied.
		separator: char,
	},
}

/// Failures surfaced by the authorization-code exchange.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Token endpoint rejected the exchange with a structured OAuth error.
	#[error("Failed to obtain access token: {error}.")]
	Provider {
		/// OAuth error code returned by the token endpoint.
		error: String,
		/// Human-readable description, when supplied.
		description: Option<String>,
		/// Provider documentation URI, when supplied.
		uri: Option<String>,
	},
	/// Transport-level failure while calling the token endpoint.
	#[error("Failed to obtain access token.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint returned an otherwise unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Other {
		/// Broker-supplied message summarizing the failure.
		message: String,
	},
}

/// Failures surfaced while fetching or mapping the user profile.
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// Transport-level failure while fetching the profile resource.
	#[error("Failed to fetch user profile.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Profile endpoint answered with a non-200 status.
	#[error("Failed to fetch user profile: HTTP {status}.")]
	Status {
		/// HTTP status code returned by the profile endpoint.
		status: u16,
		/// Verbatim response body.
		body: String,
	},
	/// Profile body is not valid JSON.
	#[error("Failed to parse user profile.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Profile body is valid JSON but does not match the configured source shape.
	#[error("Profile payload does not match the {shape} shape.")]
	Mapping {
		/// Profile source label the payload was mapped against.
		shape: &'static str,
		/// Underlying deserialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Profile payload carries no subject/guid; downstream identity matching would break.
	#[error("Profile payload is missing the subject identifier.")]
	MissingSubject,
	/// Legacy profile URLs embed the account GUID returned by the token exchange.
	#[error("Profile URL requires the account GUID from the token exchange.")]
	MissingAccountGuid,
	/// Asynchronous skip-profile predicate failed.
	#[error("Skip-profile predicate failed.")]
	SkipPredicate {
		/// Error propagated by the predicate.
		#[source]
		source: BoxError,
	},
}

//! Immutable strategy configuration, profile-source selection, and skip-profile policy.
//!
//! [`StrategyConfig`] is validated once by [`StrategyConfigBuilder::build`] and never
//! mutated afterwards. Yahoo endpoint defaults match the provider's published OAuth 2.0
//! and OpenID Connect endpoints; legacy profile templates carry a `{guid}` placeholder
//! filled from the token-exchange response.

// self
use crate::{_prelude::*, error::ConfigError, http::TokenPlacement};

/// Yahoo's OAuth 2.0 authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
/// Yahoo's OAuth 2.0 token endpoint.
pub const TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";

/// Placeholder substituted with the per-account GUID in legacy profile URL templates.
pub const GUID_PLACEHOLDER: &str = "{guid}";

/// The three historically incompatible Yahoo profile-endpoint generations.
///
/// Each generation gets its own mapping function and default endpoint; the selection is
/// an explicit configuration choice rather than a silently diverging branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
	/// OpenID Connect userinfo endpoint (`sub`/`given_name`/`family_name`).
	#[default]
	OpenIdConnect,
	/// Legacy REST profile endpoint returning a flat JSON object
	/// (`guid`/`givenName`/`familyName`).
	LegacyFlat,
	/// Legacy REST profile endpoint returning the same fields nested under a
	/// `profile` wrapper.
	LegacyNested,
}
impl ProfileSource {
	/// Returns the default profile endpoint for the generation.
	pub const fn default_profile_url(self) -> &'static str {
		match self {
			ProfileSource::OpenIdConnect => "https://api.login.yahoo.com/openid/v1/userinfo",
			ProfileSource::LegacyFlat | ProfileSource::LegacyNested =>
				"https://social.yahooapis.com/v1/user/{guid}/profile?format=json",
		}
	}

	/// Returns a stable label suitable for error messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProfileSource::OpenIdConnect => "openid_connect",
			ProfileSource::LegacyFlat => "legacy_flat",
			ProfileSource::LegacyNested => "legacy_nested",
		}
	}
}
impl Display for ProfileSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Future returned by asynchronous skip-profile predicates.
pub type SkipFuture = Pin<Box<dyn Future<Output = Result<bool, BoxError>> + Send>>;

/// Policy deciding whether the profile fetch is skipped after a successful exchange.
///
/// Replaces the original arity-sniffed flag/predicate with a discriminated choice
/// resolved at configuration time.
#[derive(Clone, Default)]
pub enum SkipProfile {
	/// Always fetch the profile.
	#[default]
	Never,
	/// Never fetch the profile; the verifier receives no profile.
	Always,
	/// Synchronous decision based on the access token.
	Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
	/// Asynchronous decision based on the access token; errors abort the flow.
	AsyncPredicate(Arc<dyn Fn(&str) -> SkipFuture + Send + Sync>),
}
impl Debug for SkipProfile {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			SkipProfile::Never => f.write_str("SkipProfile::Never"),
			SkipProfile::Always => f.write_str("SkipProfile::Always"),
			SkipProfile::Predicate(_) => f.write_str("SkipProfile::Predicate(..)"),
			SkipProfile::AsyncPredicate(_) => f.write_str("SkipProfile::AsyncPredicate(..)"),
		}
	}
}

/// Immutable strategy configuration consumed by the flow controller.
#[derive(Clone, Debug)]
pub struct StrategyConfig {
	/// Authorization endpoint users are redirected to.
	pub authorization_url: Url,
	/// Token endpoint used for the authorization-code exchange.
	pub token_url: Url,
	/// Profile endpoint template; legacy templates may contain [`GUID_PLACEHOLDER`].
	pub profile_url: String,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret for confidential clients.
	pub client_secret: Option<String>,
	/// Callback URL registered with the provider; absolute, or relative to the
	/// originating request.
	pub callback_url: Option<String>,
	/// Requested scopes.
	pub scope: Vec<String>,
	/// Separator used when joining multiple scopes into one parameter.
	pub scope_separator: char,
	/// Profile-endpoint generation to fetch and map.
	pub profile_source: ProfileSource,
	/// Skip-profile policy evaluated after each successful exchange.
	pub skip_profile: SkipProfile,
	/// Where the access token travels on profile requests; legacy endpoints predate
	/// bearer headers and need [`TokenPlacement::QueryParameter`].
	pub token_placement: TokenPlacement,
}
impl StrategyConfig {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> StrategyConfigBuilder {
		StrategyConfigBuilder::new(client_id)
	}
}

/// Builder for [`StrategyConfig`] values.
#[derive(Debug)]
pub struct StrategyConfigBuilder {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret.
	pub client_secret: Option<String>,
	/// Authorization endpoint override; defaults to [`AUTHORIZATION_URL`].
	pub authorization_url: Option<Url>,
	/// Token endpoint override; defaults to [`TOKEN_URL`].
	pub token_url: Option<Url>,
	/// Profile endpoint template override; defaults per [`ProfileSource`].
	pub profile_url: Option<String>,
	/// Callback URL registered with the provider.
	pub callback_url: Option<String>,
	/// Requested scopes.
	pub scope: Vec<String>,
	/// Scope separator; defaults to a single space.
	pub scope_separator: char,
	/// Profile-endpoint generation; defaults to [`ProfileSource::OpenIdConnect`].
	pub profile_source: ProfileSource,
	/// Skip-profile policy; defaults to [`SkipProfile::Never`].
	pub skip_profile: SkipProfile,
	/// Access-token placement on profile requests; defaults to
	/// [`TokenPlacement::AuthorizationHeader`].
	pub token_placement: TokenPlacement,
}
impl StrategyConfigBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			authorization_url: None,
			token_url: None,
			profile_url: None,
			callback_url: None,
			scope: Vec::new(),
			scope_separator: ' ',
			profile_source: ProfileSource::default(),
			skip_profile: SkipProfile::default(),
			token_placement: TokenPlacement::default(),
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the profile endpoint template.
	pub fn profile_url(mut self, url: impl Into<String>) -> Self {
		self.profile_url = Some(url.into());

		self
	}

	/// Sets the callback URL the provider redirects back to.
	pub fn callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = Some(url.into());

		self
	}

	/// Appends a requested scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope.push(scope.into());

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I>(mut self, scopes: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.scope = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the scope separator.
	pub fn scope_separator(mut self, separator: char) -> Self {
		self.scope_separator = separator;

		self
	}

	/// Selects the profile-endpoint generation.
	pub fn profile_source(mut self, source: ProfileSource) -> Self {
		self.profile_source = source;

		self
	}

	/// Overrides the skip-profile policy.
	pub fn skip_profile(mut self, policy: SkipProfile) -> Self {
		self.skip_profile = policy;

		self
	}

	/// Overrides the access-token placement on profile requests.
	pub fn token_placement(mut self, placement: TokenPlacement) -> Self {
		self.token_placement = placement;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<StrategyConfig, ConfigError> {
		if self.client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.scope_separator.is_control() {
			return Err(ConfigError::InvalidScopeSeparator { separator: self.scope_separator });
		}

		let authorization_url = match self.authorization_url {
			Some(url) => url,
			None => parse_default("authorization", AUTHORIZATION_URL)?,
		};
		let token_url = match self.token_url {
			Some(url) => url,
			None => parse_default("token", TOKEN_URL)?,
		};

		validate_endpoint("authorization", &authorization_url)?;
		validate_endpoint("token", &token_url)?;

		let profile_url = self
			.profile_url
			.unwrap_or_else(|| self.profile_source.default_profile_url().to_owned());

		Ok(StrategyConfig {
			authorization_url,
			token_url,
			profile_url,
			client_id: self.client_id,
			client_secret: self.client_secret,
			callback_url: self.callback_url,
			scope: self.scope,
			scope_separator: self.scope_separator,
			profile_source: self.profile_source,
			skip_profile: self.skip_profile,
			token_placement: self.token_placement,
		})
	}
}

fn parse_default(endpoint: &'static str, url: &str) -> Result<Url, ConfigError> {
	Url::parse(url).map_err(|_| ConfigError::InvalidEndpoint { endpoint, url: url.to_owned() })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_point_at_yahoo_endpoints() {
		let config = StrategyConfig::builder("ABC123")
			.client_secret("secret")
			.build()
			.expect("Default configuration should validate.");

		assert_eq!(config.authorization_url.as_str(), AUTHORIZATION_URL);
		assert_eq!(config.token_url.as_str(), TOKEN_URL);
		assert_eq!(config.profile_url, ProfileSource::OpenIdConnect.default_profile_url());
		assert_eq!(config.scope_separator, ' ');
		assert!(matches!(config.skip_profile, SkipProfile::Never));
		assert_eq!(config.token_placement, TokenPlacement::AuthorizationHeader);
	}

	#[test]
	fn legacy_sources_default_to_guid_template() {
		let config = StrategyConfig::builder("ABC123")
			.profile_source(ProfileSource::LegacyNested)
			.build()
			.expect("Legacy configuration should validate.");

		assert!(config.profile_url.contains(GUID_PLACEHOLDER));
	}

	#[test]
	fn rejects_empty_client_id() {
		let err = StrategyConfig::builder("").build().expect_err("Empty client id should fail.");

		assert!(matches!(err, ConfigError::MissingClientId));
	}

	#[test]
	fn rejects_insecure_endpoints() {
		let url = Url::parse("http://api.login.yahoo.com/oauth2/request_auth")
			.expect("Fixture URL should parse.");
		let err = StrategyConfig::builder("ABC123")
			.authorization_url(url)
			.build()
			.expect_err("HTTP endpoint should fail validation.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "authorization", .. }));
	}

	#[test]
	fn rejects_control_scope_separators() {
		let err = StrategyConfig::builder("ABC123")
			.scope_separator('\u{0}')
			.build()
			.expect_err("Control separator should fail validation.");

		assert!(matches!(err, ConfigError::InvalidScopeSeparator { separator: '\u{0}' }));
	}
}

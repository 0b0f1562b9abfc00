//! Authorization-code flow controller.
//!
//! [`YahooStrategy::authenticate`] inspects the inbound request and resolves it into one
//! of three legs: an authorization redirect (storing anti-forgery state first), an error
//! callback report, or a code callback that exchanges the code, loads the profile, and
//! consults the caller's [`Verifier`]. All persistence is delegated; the controller holds
//! no cross-request state.

// self
use crate::{
	_prelude::*,
	config::{SkipProfile, StrategyConfig},
	error::{AuthorizationError, ConfigError, ProfileError},
	http::{TokenHttpClient, UserInfoHttpClient},
	oauth::{CodeExchangeFacade, TokenGrant},
	obs::{AuthStage, FlowSpan},
	profile::{Profile, ProfileMapper},
	store::{StateMeta, StateStore},
	verify::{AuthInfo, Verdict, Verifier, VerifyContext},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
#[cfg(not(feature = "reqwest"))] use crate::http::NeverHttpClient;

const ACCESS_DENIED: &str = "access_denied";
const FORBIDDEN: u16 = 403;

/// OAuth callback query parameters extracted from the inbound request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthQuery {
	/// Authorization code, present on a success callback.
	pub code: Option<String>,
	/// Anti-forgery state echoed by the provider.
	pub state: Option<String>,
	/// OAuth error code, present on an error callback.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
	/// Provider documentation URI for the error.
	pub error_uri: Option<String>,
}

/// Inbound request projection consumed by [`YahooStrategy::authenticate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
	/// Parsed query parameters.
	pub query: AuthQuery,
	/// Absolute URL of the originating request, used to resolve relative callback URLs.
	pub original_url: Option<Url>,
}
impl AuthRequest {
	/// Builds a success-callback request carrying `code` and `state`.
	pub fn callback(code: impl Into<String>, state: impl Into<String>) -> Self {
		Self {
			query: AuthQuery {
				code: Some(code.into()),
				state: Some(state.into()),
				..Default::default()
			},
			original_url: None,
		}
	}
}

/// Per-call overrides for [`YahooStrategy::authenticate`].
#[derive(Clone, Debug, Default)]
pub struct AuthenticateOptions {
	/// Overrides the configured callback URL.
	pub callback_url: Option<String>,
	/// Overrides the configured scopes.
	pub scope: Option<Vec<String>>,
	/// Caller-managed state value; bypasses the state store on the redirect leg.
	pub state: Option<String>,
}

/// Outcome of one authentication pass.
///
/// Hosts map these onto their own response primitives (3xx redirect, session
/// establishment, re-prompt). Exceptional conditions are the `Err` arm of
/// [`authenticate`](YahooStrategy::authenticate) instead.
#[derive(Clone, Debug)]
pub enum AuthOutcome<U> {
	/// Send the user to the provider's authorization endpoint.
	Redirect(Url),
	/// Authentication succeeded.
	Success {
		/// Application user resolved by the verifier.
		user: U,
		/// Auxiliary info; `state` carries the store's correlation payload when present.
		info: AuthInfo,
	},
	/// Authentication was rejected non-fatally; the host may re-prompt.
	Failure {
		/// Failure detail (denied-consent message, rejected state payload, or
		/// verifier-supplied info).
		info: AuthInfo,
		/// Suggested HTTP status; `403` for state rejections.
		status: Option<u16>,
	},
}

/// Yahoo authentication strategy coordinating the authorization-code flow.
pub struct YahooStrategy<V, C = ReqwestHttpClientDefault>
where
	V: Verifier,
	C: ?Sized + TokenHttpClient + UserInfoHttpClient,
{
	config: StrategyConfig,
	store: Arc<dyn StateStore>,
	verifier: V,
	http_client: Arc<C>,
	facade: CodeExchangeFacade<C>,
	mapper: ProfileMapper,
}

#[cfg(feature = "reqwest")]
type ReqwestHttpClientDefault = ReqwestHttpClient;
#[cfg(not(feature = "reqwest"))]
type ReqwestHttpClientDefault = NeverHttpClient;

impl<V, C> YahooStrategy<V, C>
where
	V: Verifier,
	C: ?Sized + TokenHttpClient + UserInfoHttpClient,
{
	/// Strategy name, constant for every profile it produces.
	pub const NAME: &'static str = crate::profile::PROVIDER;

	/// Creates a strategy that reuses the caller-provided transport.
	pub fn with_http_client(
		config: StrategyConfig,
		store: Arc<dyn StateStore>,
		verifier: V,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let facade = CodeExchangeFacade::from_config(&config, http_client.clone())?;
		let mapper = ProfileMapper::new(config.profile_source, config.profile_url.clone());

		Ok(Self { config, store, verifier, http_client, facade, mapper })
	}

	/// Immutable configuration this strategy was built with.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Drives one inbound request through the flow.
	pub async fn authenticate(
		&self,
		request: &AuthRequest,
		options: AuthenticateOptions,
	) -> Result<AuthOutcome<V::User>> {
		if let Some(error) = request.query.error.as_deref() {
			if error == ACCESS_DENIED {
				let info = request
					.query
					.error_description
					.clone()
					.map(AuthInfo::with_message)
					.unwrap_or_default();

				return Ok(AuthOutcome::Failure { info, status: None });
			}

			return Err(AuthorizationError {
				error: error.to_owned(),
				description: request.query.error_description.clone(),
				uri: request.query.error_uri.clone(),
			}
			.into());
		}

		let callback_url = self.resolve_callback_url(request, &options)?;
		let meta = self.state_meta();

		if let Some(code) = request.query.code.as_deref() {
			self.handle_callback(request, code, callback_url.as_ref(), &meta).await
		} else {
			self.start_redirect(request, &options, callback_url.as_ref(), &meta).await
		}
	}

	async fn handle_callback(
		&self,
		request: &AuthRequest,
		code: &str,
		callback_url: Option<&Url>,
		meta: &StateMeta,
	) -> Result<AuthOutcome<V::User>> {
		let verification = FlowSpan::new(AuthStage::StateVerify)
			.instrument(self.store.verify(request, request.query.state.as_deref(), meta))
			.await?;

		if !verification.ok {
			let info = verification.state.map(AuthInfo::with_detail).unwrap_or_default();

			return Ok(AuthOutcome::Failure { info, status: Some(FORBIDDEN) });
		}

		let grant = FlowSpan::new(AuthStage::Exchange)
			.instrument(self.facade.exchange_authorization_code(code, callback_url))
			.await?;
		let profile = self.load_user_profile(&grant).await?;
		let ctx = VerifyContext {
			request: request.clone(),
			access_token: grant.access_token.clone(),
			refresh_token: grant.refresh_token.clone(),
			exchange: grant.params.clone(),
			profile,
		};
		let verdict = FlowSpan::new(AuthStage::Verify)
			.instrument(self.verifier.verify(ctx))
			.await
			.map_err(|source| Error::Verify { source })?;

		match verdict {
			Verdict::Authenticated { user, mut info } => {
				if let Some(stored) = verification.state {
					info.state = Some(stored);
				}

				Ok(AuthOutcome::Success { user, info })
			},
			Verdict::Rejected { info } => Ok(AuthOutcome::Failure { info, status: None }),
		}
	}

	async fn start_redirect(
		&self,
		request: &AuthRequest,
		options: &AuthenticateOptions,
		callback_url: Option<&Url>,
		meta: &StateMeta,
	) -> Result<AuthOutcome<V::User>> {
		let scope = options.scope.as_deref().unwrap_or(&self.config.scope);
		let state = match &options.state {
			Some(state) => state.clone(),
			None =>
				FlowSpan::new(AuthStage::StateStore)
					.instrument(self.store.store(request, meta))
					.await?,
		};
		let location = self.build_authorization_url(callback_url, scope, &state);

		Ok(AuthOutcome::Redirect(location))
	}

	async fn load_user_profile(&self, grant: &TokenGrant) -> Result<Option<Profile>> {
		let skip = match &self.config.skip_profile {
			SkipProfile::Never => false,
			SkipProfile::Always => true,
			SkipProfile::Predicate(predicate) => predicate(&grant.access_token),
			SkipProfile::AsyncPredicate(predicate) => predicate(&grant.access_token)
				.await
				.map_err(|source| ProfileError::SkipPredicate { source })?,
		};

		if skip {
			return Ok(None);
		}

		let url = self.mapper.request_url(&grant.params)?;
		let response = FlowSpan::new(AuthStage::Profile)
			.instrument(self.http_client.get_user_info(
				url,
				&grant.access_token,
				self.config.token_placement,
			))
			.await?;

		if response.status != 200 {
			return Err(ProfileError::Status { status: response.status, body: response.body }
				.into());
		}

		Ok(Some(self.mapper.map(&response.body)?))
	}

	fn state_meta(&self) -> StateMeta {
		StateMeta {
			authorization_url: self.config.authorization_url.clone(),
			token_url: self.config.token_url.clone(),
			client_id: self.config.client_id.clone(),
		}
	}

	fn resolve_callback_url(
		&self,
		request: &AuthRequest,
		options: &AuthenticateOptions,
	) -> Result<Option<Url>> {
		let raw = options.callback_url.as_deref().or(self.config.callback_url.as_deref());
		let Some(raw) = raw else {
			return Ok(None);
		};

		match Url::parse(raw) {
			Ok(url) => Ok(Some(url)),
			Err(url::ParseError::RelativeUrlWithoutBase) => {
				let base = request
					.original_url
					.as_ref()
					.ok_or(ConfigError::RelativeCallbackWithoutBase)?;

				base.join(raw)
					.map(Some)
					.map_err(|source| ConfigError::InvalidCallback { source }.into())
			},
			Err(source) => Err(ConfigError::InvalidCallback { source }.into()),
		}
	}

	/// Merges the flow parameters into the authorization endpoint's query string.
	/// New parameters override preexisting duplicates; `client_id` is always forced.
	fn build_authorization_url(
		&self,
		callback_url: Option<&Url>,
		scope: &[String],
		state: &str,
	) -> Url {
		const OWNED_PARAMS: [&str; 5] =
			["response_type", "redirect_uri", "scope", "state", "client_id"];

		let mut url = self.config.authorization_url.clone();
		let retained = url
			.query_pairs()
			.filter(|(key, _)| !OWNED_PARAMS.contains(&key.as_ref()))
			.map(|(key, value)| (key.into_owned(), value.into_owned()))
			.collect::<Vec<_>>();

		url.set_query(None);

		{
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &retained {
				pairs.append_pair(key, value);
			}

			pairs.append_pair("response_type", "code");

			if let Some(callback) = callback_url {
				pairs.append_pair("redirect_uri", callback.as_str());
			}
			if !scope.is_empty() {
				pairs.append_pair(
					"scope",
					&scope.join(&self.config.scope_separator.to_string()),
				);
			}

			pairs.append_pair("state", state);
			pairs.append_pair("client_id", &self.config.client_id);
		}

		url
	}
}
impl<V, C> Debug for YahooStrategy<V, C>
where
	V: Verifier,
	C: ?Sized + TokenHttpClient + UserInfoHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("YahooStrategy")
			.field("config", &self.config)
			.field("name", &Self::NAME)
			.finish()
	}
}

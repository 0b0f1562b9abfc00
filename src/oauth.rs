//! Internal facade over the generic `oauth2` client.
//!
//! Token-endpoint mechanics (header construction, form encoding, error payloads) belong
//! to the `oauth2` crate; this module only configures it for Yahoo and keeps the extra
//! token-response fields (`xoauth_yahoo_guid`, `id_token`) that legacy profile fetches
//! and verifiers need.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, RedirectUrl, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	config::StrategyConfig,
	error::{ConfigError, ExchangeError},
	http::TokenHttpClient,
};

type ExchangeTokenResponse = StandardTokenResponse<ExchangeFields, BasicTokenType>;
type ConfiguredClient = Client<
	BasicErrorResponse,
	ExchangeTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Extra fields Yahoo returns alongside the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeFields {
	/// Per-account GUID required to build legacy profile URLs.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub xoauth_yahoo_guid: Option<String>,
	/// OpenID Connect ID token; opaque to this layer, no cryptographic verification.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for ExchangeFields {}

/// Token-endpoint response parameters forwarded to the profile mapper and verifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeParams {
	/// Token type reported by the provider (typically `bearer`).
	pub token_type: Option<String>,
	/// Lifetime of the access token in seconds, as reported; not tracked here.
	pub expires_in: Option<u64>,
	/// Per-account GUID (`xoauth_yahoo_guid`).
	pub account_guid: Option<String>,
	/// OpenID Connect ID token, when issued.
	pub id_token: Option<String>,
}

/// Result of a successful authorization-code exchange.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Access token issued by the provider.
	pub access_token: String,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<String>,
	/// Extra response parameters.
	pub params: ExchangeParams,
}

pub(crate) struct CodeExchangeFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
}
impl<C> CodeExchangeFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	pub(crate) fn from_config(
		config: &StrategyConfig,
		http_client: Arc<C>,
	) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::new(config.authorization_url.to_string()).map_err(|_| {
			ConfigError::InvalidEndpoint {
				endpoint: "authorization",
				url: config.authorization_url.to_string(),
			}
		})?;
		let token_url = TokenUrl::new(config.token_url.to_string()).map_err(|_| {
			ConfigError::InvalidEndpoint { endpoint: "token", url: config.token_url.to_string() }
		})?;
		let mut oauth_client = Client::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			// Credentials travel in the POST body, matching Yahoo's documented exchange.
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = config.client_secret.as_deref() {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges an authorization code for tokens, passing `redirect_uri` when resolved.
	pub(crate) fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: Option<&'a Url>,
	) -> FacadeFuture<'a, TokenGrant> {
		Box::pin(async move {
			let handle = self.http_client.token_handle();
			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(redirect) = redirect_uri {
				let redirect_url = RedirectUrl::new(redirect.to_string())
					.map_err(|source| ConfigError::InvalidCallback { source })?;

				request = request.set_redirect_uri(Cow::Owned(redirect_url));
			}

			let response = request.request_async(&handle).await.map_err(map_request_error)?;
			let extra = response.extra_fields();
			let params = ExchangeParams {
				token_type: token_type_label(&response),
				expires_in: response.expires_in().map(|duration| duration.as_secs()),
				account_guid: extra.xoauth_yahoo_guid.clone(),
				id_token: extra.id_token.clone(),
			};

			Ok(TokenGrant {
				access_token: response.access_token().secret().to_owned(),
				refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
				params,
			})
		})
	}
}

fn token_type_label(response: &ExchangeTokenResponse) -> Option<String> {
	serde_json::to_value(response.token_type())
		.ok()
		.and_then(|value| value.as_str().map(ToOwned::to_owned))
}

fn map_request_error<E>(err: BasicRequestTokenError<HttpClientError<E>>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => ExchangeError::Provider {
			error: response.error().as_ref().to_owned(),
			description: response.error_description().cloned(),
			uri: response.error_uri().cloned(),
		}
		.into(),
		RequestTokenError::Request(error) =>
			ExchangeError::Transport { source: Box::new(error) }.into(),
		RequestTokenError::Parse(source, _body) => ExchangeError::Parse { source }.into(),
		RequestTokenError::Other(message) => ExchangeError::Other { message }.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn exchange_fields_capture_yahoo_extras() {
		let body = r#"{
			"access_token": "a",
			"token_type": "bearer",
			"expires_in": 3600,
			"xoauth_yahoo_guid": "12345",
			"id_token": "jwt"
		}"#;
		let response: ExchangeTokenResponse =
			serde_json::from_str(body).expect("Token response fixture should deserialize.");
		let extra = response.extra_fields();

		assert_eq!(extra.xoauth_yahoo_guid.as_deref(), Some("12345"));
		assert_eq!(extra.id_token.as_deref(), Some("jwt"));
		assert_eq!(token_type_label(&response), Some("bearer".into()));
	}

	#[test]
	fn exchange_fields_tolerate_plain_responses() {
		let body = r#"{"access_token": "a", "token_type": "bearer"}"#;
		let response: ExchangeTokenResponse =
			serde_json::from_str(body).expect("Token response fixture should deserialize.");

		assert_eq!(response.extra_fields(), &ExchangeFields::default());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn builds_facade_from_validated_config() {
		use crate::{config::StrategyConfig, http::ReqwestHttpClient};

		let config = StrategyConfig::builder("ABC123")
			.client_secret("secret")
			.build()
			.expect("Default configuration should validate.");
		let facade = CodeExchangeFacade::from_config(
			&config,
			Arc::new(ReqwestHttpClient::default()),
		);

		assert!(facade.is_ok());
	}
}

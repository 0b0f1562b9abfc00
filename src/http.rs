//! Transport primitives for the token exchange and the profile fetch.
//!
//! Two seams keep the strategy HTTP-stack agnostic: [`TokenHttpClient`] hands the
//! `oauth2` crate an [`AsyncHttpClient`] for the code exchange, and
//! [`UserInfoHttpClient`] performs the authenticated profile GET. The access token's
//! placement is an explicit per-request parameter ([`TokenPlacement`]) rather than a
//! mutable client-wide toggle.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::ProfileError};

/// Boxed future returned by [`UserInfoHttpClient::get_user_info`].
pub type UserInfoFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UserInfoResponse, ProfileError>> + 'a + Send>>;

/// Where the access token travels on the profile request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPlacement {
	/// `Authorization: Bearer <token>` request header.
	#[default]
	AuthorizationHeader,
	/// `access_token` query parameter, for endpoints that predate bearer headers.
	QueryParameter,
}

/// Status and verbatim body of a profile response; interpretation happens in the mapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfoResponse {
	/// HTTP status code.
	pub status: u16,
	/// Exact response body.
	pub body: String,
}

/// Abstraction over HTTP transports capable of executing the OAuth token exchange.
///
/// The trait is the strategy's only dependency on an HTTP stack for the exchange leg.
/// Handles must be `Send + Sync` and their request futures `Send` so the boxed facade
/// futures stay `Send` for the lifetime of an in-flight authentication.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single token request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle for one exchange.
	fn token_handle(&self) -> Self::Handle;
}

/// Authenticated-GET capability used to fetch the profile resource.
pub trait UserInfoHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Issues a GET carrying the access token per `placement` and returns the raw
	/// status + body. Only transport failures error here; non-200 statuses are data.
	fn get_user_info(
		&self,
		url: Url,
		access_token: &str,
		placement: TokenPlacement,
	) -> UserInfoFuture<'_>;
}

/// Uninhabited default transport used when the `reqwest` feature is disabled; it can never
/// be constructed, so callers supply their own [`TokenHttpClient`] + [`UserInfoHttpClient`]
/// implementation instead.
#[cfg(not(feature = "reqwest"))]
#[derive(Clone, Copy, Debug)]
pub enum NeverHttpClient {}
#[cfg(not(feature = "reqwest"))]
impl<'c> AsyncHttpClient<'c> for NeverHttpClient {
	type Error = HttpClientError<std::convert::Infallible>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, _: HttpRequest) -> Self::Future {
		match *self {}
	}
}
#[cfg(not(feature = "reqwest"))]
impl TokenHttpClient for NeverHttpClient {
	type Handle = Self;
	type TransportError = std::convert::Infallible;

	fn token_handle(&self) -> Self::Handle {
		match *self {}
	}
}
#[cfg(not(feature = "reqwest"))]
impl UserInfoHttpClient for NeverHttpClient {
	fn get_user_info(&self, _: Url, _: &str, _: TokenPlacement) -> UserInfoFuture<'_> {
		match *self {}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token requests should not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly, because the strategy passes this client into the `oauth2` crate.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(feature = "reqwest")]
/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone)]
pub struct ReqwestTokenHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestTokenHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestTokenHandle;
	type TransportError = ReqwestError;

	fn token_handle(&self) -> Self::Handle {
		ReqwestTokenHandle(self.0.clone())
	}
}
#[cfg(feature = "reqwest")]
impl UserInfoHttpClient for ReqwestHttpClient {
	fn get_user_info(
		&self,
		url: Url,
		access_token: &str,
		placement: TokenPlacement,
	) -> UserInfoFuture<'_> {
		let client = self.0.clone();
		let access_token = access_token.to_owned();

		Box::pin(async move {
			let request = match placement {
				TokenPlacement::AuthorizationHeader =>
					client.get(url).bearer_auth(&access_token),
				TokenPlacement::QueryParameter =>
					client.get(url).query(&[("access_token", access_token.as_str())]),
			};
			let response = request
				.send()
				.await
				.map_err(|err| ProfileError::Transport { source: Box::new(err) })?;
			let status = response.status().as_u16();
			let body = response
				.text()
				.await
				.map_err(|err| ProfileError::Transport { source: Box::new(err) })?;

			Ok(UserInfoResponse { status, body })
		})
	}
}

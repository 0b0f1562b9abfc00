//! Caller-supplied verification seam invoked after a successful code exchange.
//!
//! The original callback came in four arities depending on whether the caller wanted the
//! exchange parameters and/or the originating request. [`VerifyContext`] simply always
//! carries both; callers ignore what they do not need.

// self
use crate::{_prelude::*, flow::AuthRequest, oauth::ExchangeParams, profile::Profile};

/// Boxed future returned by [`Verifier::verify`].
pub type VerifyFuture<'a, U> =
	Pin<Box<dyn Future<Output = Result<Verdict<U>, BoxError>> + 'a + Send>>;

/// Everything the strategy knows about the authenticated exchange, handed to the verifier.
#[derive(Clone, Debug)]
pub struct VerifyContext {
	/// Originating callback request.
	pub request: AuthRequest,
	/// Access token issued by the provider.
	pub access_token: String,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<String>,
	/// Extra token-endpoint response parameters.
	pub exchange: ExchangeParams,
	/// Normalized profile; `None` when the skip-profile policy suppressed the fetch.
	pub profile: Option<Profile>,
}

/// Decision returned by a [`Verifier`].
#[derive(Clone, Debug)]
pub enum Verdict<U> {
	/// Credentials map to a known user; authentication succeeds.
	Authenticated {
		/// Application user resolved by the verifier.
		user: U,
		/// Additional info forwarded to the host alongside the user.
		info: AuthInfo,
	},
	/// Credentials are valid but no user could be established; authentication fails
	/// non-fatally with the supplied detail.
	Rejected {
		/// Caller-supplied failure detail.
		info: AuthInfo,
	},
}

/// Auxiliary information attached to success and failure outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
	/// Human-readable message (e.g. the provider's `error_description`).
	pub message: Option<String>,
	/// Structured detail (e.g. the rejected state payload).
	pub detail: Option<Json>,
	/// Correlation state payload returned by the state store.
	pub state: Option<Json>,
}
impl AuthInfo {
	/// Builds an info record carrying only a message.
	pub fn with_message(message: impl Into<String>) -> Self {
		Self { message: Some(message.into()), ..Default::default() }
	}

	/// Builds an info record carrying only a structured detail.
	pub fn with_detail(detail: Json) -> Self {
		Self { detail: Some(detail), ..Default::default() }
	}
}

/// Application hook resolving an exchange into a user.
pub trait Verifier
where
	Self: Send + Sync,
{
	/// Application user type produced on success.
	type User: Send;

	/// Resolves the context into a [`Verdict`]; an `Err` aborts the flow as an
	/// exceptional condition.
	fn verify(&self, ctx: VerifyContext) -> VerifyFuture<'_, Self::User>;
}

/// Adapter implementing [`Verifier`] for a synchronous closure.
///
/// Handy for tests and callers whose lookup completes without awaiting; asynchronous
/// verifiers implement the trait directly.
pub struct VerifyFn<F>(pub F);
impl<F, U> Verifier for VerifyFn<F>
where
	F: Fn(VerifyContext) -> Result<Verdict<U>, BoxError> + Send + Sync,
	U: Send + 'static,
{
	type User = U;

	fn verify(&self, ctx: VerifyContext) -> VerifyFuture<'_, U> {
		let verdict = (self.0)(ctx);

		Box::pin(async move { verdict })
	}
}

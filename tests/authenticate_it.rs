#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use yahoo_oauth2_strategy::{
	_preludet::*,
	config::StrategyConfig,
	error::{Error, ExchangeError},
	flow::{AuthOutcome, AuthRequest, AuthenticateOptions, YahooStrategy},
	store::{StateMeta, StateStore, StateStoreError, StateStoreFuture, StateVerification},
	verify::{AuthInfo, Verdict, VerifyContext, VerifyFn},
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";
const STATE: &str = "state-it";

fn build_config(server: &MockServer) -> StrategyConfig {
	StrategyConfig::builder(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.authorization_url(
			Url::parse(&server.url("/request_auth"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_url(
			Url::parse(&server.url("/get_token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.profile_url(server.url("/openid/v1/userinfo"))
		.callback_url("https://www.example.net/auth/yahoo/callback")
		.scopes(["openid"])
		.build()
		.expect("Mock-backed configuration should validate.")
}

async fn mock_token_success(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/get_token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-success\",\"refresh_token\":\"refresh-success\",\
				 \"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await
}

async fn mock_userinfo_success(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/openid/v1/userinfo")
				.header("authorization", "Bearer access-success");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"sub\":\"ID1\",\"given_name\":\"A\",\"family_name\":\"B\"}");
		})
		.await
}

#[tokio::test]
async fn success_callback_exchanges_code_and_authenticates() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier = VerifyFn(|ctx: VerifyContext| {
		let profile = ctx.profile.as_ref().expect("Profile should be loaded by default.");

		assert_eq!(profile.provider, "yahoo");
		assert_eq!(ctx.access_token, "access-success");
		assert_eq!(ctx.refresh_token.as_deref(), Some("refresh-success"));
		assert_eq!(ctx.exchange.token_type.as_deref(), Some("bearer"));
		assert_eq!(ctx.exchange.expires_in, Some(3600));

		Ok(Verdict::Authenticated { user: profile.id.clone(), info: AuthInfo::default() })
	});
	let (strategy, store) = build_reqwest_test_strategy(config, verifier);
	let payload = serde_json::json!({"returnTo": "/dashboard"});

	store.seed(STATE, Some(payload.clone()));

	let token_mock = mock_token_success(&server).await;
	let userinfo_mock = mock_userinfo_success(&server).await;
	let request = AuthRequest::callback("valid-code", STATE);
	let outcome = strategy
		.authenticate(&request, AuthenticateOptions::default())
		.await
		.expect("Callback with a valid code and state should authenticate.");

	token_mock.assert_async().await;
	userinfo_mock.assert_async().await;

	let AuthOutcome::Success { user, info } = outcome else {
		panic!("Valid callback must authenticate.");
	};

	assert_eq!(user, "ID1");
	assert_eq!(info.state, Some(payload), "Stored state payload must ride along on success.");
}

#[tokio::test]
async fn token_endpoint_rejection_is_an_exchange_error() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier = VerifyFn(|_: VerifyContext| {
		Ok(Verdict::Authenticated { user: (), info: AuthInfo::default() })
	});
	let (strategy, store) = build_reqwest_test_strategy(config, verifier);

	store.seed(STATE, None);

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/get_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"code expired\"}");
		})
		.await;
	let request = AuthRequest::callback("stale-code", STATE);
	let err = strategy
		.authenticate(&request, AuthenticateOptions::default())
		.await
		.expect_err("A rejected exchange is exceptional.");

	token_mock.assert_async().await;

	assert!(matches!(
		err,
		Error::Exchange(ExchangeError::Provider { ref error, ref description, .. })
			if error == "invalid_grant" && description.as_deref() == Some("code expired")
	));
}

#[tokio::test]
async fn verifier_rejection_is_a_non_fatal_failure() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier = VerifyFn(|_: VerifyContext| -> Result<Verdict<()>, BoxError> {
		Ok(Verdict::Rejected { info: AuthInfo::with_message("unknown account") })
	});
	let (strategy, store) = build_reqwest_test_strategy(config, verifier);

	store.seed(STATE, None);

	let _token_mock = mock_token_success(&server).await;
	let _userinfo_mock = mock_userinfo_success(&server).await;
	let request = AuthRequest::callback("valid-code", STATE);
	let outcome = strategy
		.authenticate(&request, AuthenticateOptions::default())
		.await
		.expect("A verifier rejection is not exceptional.");

	assert!(matches!(
		outcome,
		AuthOutcome::Failure { ref info, status: None }
			if info.message.as_deref() == Some("unknown account")
	));
}

#[tokio::test]
async fn verifier_errors_abort_the_flow() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier =
		VerifyFn(|_: VerifyContext| Err::<Verdict<()>, _>(BoxError::from("directory offline")));
	let (strategy, store) = build_reqwest_test_strategy(config, verifier);

	store.seed(STATE, None);

	let _token_mock = mock_token_success(&server).await;
	let _userinfo_mock = mock_userinfo_success(&server).await;
	let request = AuthRequest::callback("valid-code", STATE);
	let err = strategy
		.authenticate(&request, AuthenticateOptions::default())
		.await
		.expect_err("A failing verifier is exceptional.");

	assert!(matches!(err, Error::Verify { .. }));
}

#[tokio::test]
async fn forged_state_never_reaches_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier = VerifyFn(|_: VerifyContext| {
		Ok(Verdict::Authenticated { user: (), info: AuthInfo::default() })
	});
	let (strategy, _store) = build_reqwest_test_strategy(config, verifier);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/get_token");
			then.status(200);
		})
		.await;
	let request = AuthRequest::callback("valid-code", "never-issued");
	let outcome = strategy
		.authenticate(&request, AuthenticateOptions::default())
		.await
		.expect("State rejection is a non-fatal failure.");

	assert!(matches!(outcome, AuthOutcome::Failure { status: Some(403), .. }));
	assert_eq!(token_mock.hits_async().await, 0);
}

struct UnavailableStateStore;
impl StateStore for UnavailableStateStore {
	fn store<'a>(
		&'a self,
		_request: &'a AuthRequest,
		_meta: &'a StateMeta,
	) -> StateStoreFuture<'a, String> {
		Box::pin(async {
			Err(StateStoreError::Store { message: "session backend offline".into() })
		})
	}

	fn verify<'a>(
		&'a self,
		_request: &'a AuthRequest,
		_state: Option<&'a str>,
		_meta: &'a StateMeta,
	) -> StateStoreFuture<'a, StateVerification> {
		Box::pin(async {
			Err(StateStoreError::Verify { message: "session backend offline".into() })
		})
	}
}

#[tokio::test]
async fn state_store_failures_are_exceptional_on_both_legs() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let verifier = VerifyFn(|_: VerifyContext| -> Result<Verdict<()>, BoxError> {
		panic!("Verifier must not run when the state store is unavailable.");
	});
	let store: Arc<dyn StateStore> = Arc::new(UnavailableStateStore);
	let strategy =
		YahooStrategy::with_http_client(config, store, verifier, test_reqwest_http_client())
			.expect("Test strategy should build from a validated configuration.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/get_token");
			then.status(200);
		})
		.await;
	let redirect_err = strategy
		.authenticate(&AuthRequest::default(), AuthenticateOptions::default())
		.await
		.expect_err("Failing to store state is exceptional.");

	assert!(matches!(
		redirect_err,
		Error::Store(StateStoreError::Store { ref message }) if message == "session backend offline"
	));

	let callback_err = strategy
		.authenticate(&AuthRequest::callback("valid-code", STATE), AuthenticateOptions::default())
		.await
		.expect_err("Failing to verify state is exceptional.");

	assert!(matches!(callback_err, Error::Store(StateStoreError::Verify { .. })));
	assert_eq!(token_mock.hits_async().await, 0);
}

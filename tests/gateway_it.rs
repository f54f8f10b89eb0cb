#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use adrive_auth::{
	_preludet::*,
	error::{AuthError, Endpoint, Error, NetworkError},
	gateway::{ApiRequest, Gateway},
};

fn token_body(access: &str, refresh: &str) -> Value {
	json!({
		"access_token": access,
		"refresh_token": refresh,
		"expires_in": 7200,
		"device_id": "D1",
		"user_id": "U1",
	})
}

async fn mock_rotations(server: &MockServer) {
	let rotations = [("R0", "A1", "R1"), ("R1", "A2", "R2"), ("R2", "A3", "R3")];

	for (presented, access, rotated) in rotations {
		server
			.mock_async(|when, then| {
				when.method(POST).path("/v2/account/token").json_body(
					json!({ "refresh_token": presented, "grant_type": "refresh_token" }),
				);
				then.status(200).json_body(token_body(access, rotated));
			})
			.await;
	}

	server
		.mock_async(|when, then| {
			when.method(GET).path("/alisign");
			then.status(200).json_body(json!({ "sign": ["S"] }));
		})
		.await;
}

fn gateway(server: &MockServer) -> ReqwestTestGateway {
	Gateway::new(build_reqwest_test_manager(mock_descriptor(&server.base_url()), "R0"))
}

#[tokio::test]
async fn requests_carry_session_headers_over_call_headers() {
	let server = MockServer::start_async().await;

	mock_rotations(&server).await;

	let api = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/adrive/v2/user/get")
				.header("authorization", "Bearer A1")
				.header("x-device-id", "D1")
				.header("x-signature", "S")
				.header("x-request-id", "call-1");
			then.status(200).json_body(json!({ "user_id": "U1" }));
		})
		.await;
	let gateway = gateway(&server);
	let request = ApiRequest::get("/adrive/v2/user/get")
		.header("authorization", "Bearer caller")
		.expect("Header should be valid.")
		.header("x-request-id", "call-1")
		.expect("Header should be valid.");
	let response = gateway.send(request).await.expect("Authenticated call should succeed.");

	assert_eq!(response.status(), 200);

	api.assert_calls_async(1).await;
}

#[tokio::test]
async fn unauthorized_response_forces_one_refresh_and_retry() {
	let server = MockServer::start_async().await;

	mock_rotations(&server).await;

	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path("/adrive/v3/file/list").header("authorization", "Bearer A1");
			then.status(401).json_body(json!({ "code": "AccessTokenInvalid" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/adrive/v3/file/list")
				.header("authorization", "Bearer A2")
				.json_body(json!({ "drive_id": "drive-1", "parent_file_id": "root" }));
			then.status(200).json_body(json!({ "items": [], "next_marker": "" }));
		})
		.await;
	let gateway = gateway(&server);
	let listing: Value = gateway
		.post_json(
			"adrive/v3/file/list",
			&json!({ "drive_id": "drive-1", "parent_file_id": "root" }),
		)
		.await
		.expect("Retried call should succeed.");

	assert_eq!(listing["next_marker"], "");
	assert_eq!(gateway.session().generation(), 2);
	assert_eq!(gateway.session().refresh_credential().expose(), "R2");

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn second_unauthorized_response_is_an_auth_error() {
	let server = MockServer::start_async().await;

	mock_rotations(&server).await;

	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/adrive/v2/user/get");
			then.status(401);
		})
		.await;
	let gateway = gateway(&server);
	let err = gateway
		.send(ApiRequest::get("adrive/v2/user/get"))
		.await
		.expect_err("Two rejections should surface.");

	assert!(matches!(err, Error::Auth(AuthError::RequestRejected { status: 401 })));
	assert_eq!(gateway.session().generation(), 2, "Exactly one forced refresh is expected.");

	api.assert_calls_async(2).await;
}

#[tokio::test]
async fn other_statuses_pass_through() {
	let server = MockServer::start_async().await;

	mock_rotations(&server).await;

	let api = server
		.mock_async(|when, then| {
			when.method(POST).path("/adrive/v3/file/get");
			then.status(404).json_body(json!({ "code": "NotFound.File" }));
		})
		.await;
	let gateway = gateway(&server);
	let request = ApiRequest::post("adrive/v3/file/get")
		.json(&json!({ "file_id": "missing" }))
		.expect("Body should encode.");
	let response = gateway
		.send(request)
		.await
		.expect("Non-auth failures should be returned to the caller.");

	assert_eq!(response.status(), 404);

	let err = gateway
		.post_json::<_, Value>("adrive/v3/file/get", &json!({ "file_id": "missing" }))
		.await
		.expect_err("Typed calls should reject non-success statuses.");

	assert!(matches!(
		err,
		Error::Network(NetworkError::Status { endpoint: Endpoint::Api, status: 404, .. })
	));
	assert_eq!(gateway.session().generation(), 1);

	api.assert_calls_async(2).await;
}

#[tokio::test]
async fn concurrent_rejections_share_one_refresh() {
	let server = MockServer::start_async().await;

	mock_rotations(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/adrive/v2/user/get").header("authorization", "Bearer A1");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/adrive/v2/user/get").header("authorization", "Bearer A2");
			then.status(200).json_body(json!({ "user_id": "U1" }));
		})
		.await;

	let gateway = gateway(&server);

	gateway.session().ensure_valid_session().await.expect("First session should be established.");

	let (first, second) = tokio::join!(
		gateway.send(ApiRequest::get("adrive/v2/user/get")),
		gateway.send(ApiRequest::get("adrive/v2/user/get")),
	);

	assert_eq!(first.expect("First caller should recover.").status(), 200);
	assert_eq!(second.expect("Second caller should recover.").status(), 200);
	assert_eq!(gateway.session().generation(), 2);
	assert_eq!(gateway.session().metrics().refreshes(), 2);
}

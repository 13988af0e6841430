use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use serde_json::Value;

use crate::{
    AppState, build_router,
    test_utils::fixtures::{create_test_user, get_test_connection},
};

/// A server running the full router over an in-memory database.
///
/// Passwords are hashed with the minimum bcrypt cost to keep tests fast.
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let mut state = AppState::from_connection(get_test_connection(), "secret");
    state.password_cost = 4;
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

/// Register `username` directly in the database and issue them a session token.
pub(crate) fn token_for(state: &AppState, username: &str) -> String {
    create_test_user(&state.db_connection, username);

    state.token_codec.issue(username).unwrap()
}

#[track_caller]
pub(crate) fn assert_json_error(response: &TestResponse, status: StatusCode) {
    response.assert_status(status);

    let body = response.json::<Value>();
    assert!(
        body["error"].is_string(),
        "expected a JSON error body, got {body}"
    );
}

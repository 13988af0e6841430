//! Handlers for registration, log-in, log-out and password changes.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, AuthenticatedUser, Credentials, Error, PasswordChange, Registration,
    auth::{change_password, invalidate_auth_cookie, log_in, register, set_auth_cookie},
    routes::extract::ApiJson,
    user::User,
};

/// The body returned after a successful registration or log-in.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionResponse {
    pub(crate) token: String,
    pub(crate) username: String,
    pub(crate) email: String,
}

impl SessionResponse {
    fn new(user: &User, token: String) -> Self {
        Self {
            token,
            username: user.username.clone(),
            email: user.email.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

/// Register a new user and start a session for them.
///
/// The token is returned in the body and set as a cookie.
pub(crate) async fn register_endpoint(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), Error> {
    let (user, token) = register(
        registration,
        &mut state.user_store(),
        &state.token_codec,
        state.password_cost,
    )?;

    Ok((
        StatusCode::CREATED,
        set_auth_cookie(jar, token.clone()),
        Json(SessionResponse::new(&user, token)),
    ))
}

pub(crate) async fn log_in_endpoint(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(CookieJar, Json<SessionResponse>), Error> {
    let (user, token) = log_in(credentials, &state.user_store(), &state.token_codec)?;

    Ok((
        set_auth_cookie(jar, token.clone()),
        Json(SessionResponse::new(&user, token)),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ValidTokenResponse {
    pub(crate) username: String,
    pub(crate) message: String,
}

/// Confirm that the request carries a valid session token.
pub(crate) async fn validate_token_endpoint(
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<ValidTokenResponse> {
    Json(ValidTokenResponse {
        username: user.username,
        message: "Token is valid".to_owned(),
    })
}

pub(crate) async fn change_password_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<Json<MessageResponse>, Error> {
    change_password(&user, change, &mut state.user_store(), state.password_cost)?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_owned(),
    }))
}

/// Clear the session cookie.
///
/// Tokens are not stored on the server, so a client holding a copy of the
/// token can keep using it until it expires.
pub(crate) async fn log_out_endpoint(jar: CookieJar) -> (CookieJar, StatusCode) {
    (invalidate_auth_cookie(jar), StatusCode::NO_CONTENT)
}

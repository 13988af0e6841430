//! An extractor that authenticates a request before the handler runs.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    extract::CookieJar,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState, AuthError, Error,
    auth::{cookie::get_token_from_cookies, guard::resolve_user},
    user::User,
};

/// The user who sent the request.
///
/// The session token is read from the `Authorization: Bearer` header, falling
/// back to the `authToken` cookie. Handlers that take this extractor are only
/// called for requests with a valid token for a registered user; all other
/// requests are rejected with `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = get_request_token(parts, state)
            .await
            .ok_or(AuthError::Unauthenticated)?;
        let state = AppState::from_ref(state);

        resolve_user(&token, &state.token_codec, &state.user_store()).map(AuthenticatedUser)
    }
}

/// Get the raw session token from the request headers or cookies.
async fn get_request_token<S>(parts: &mut Parts, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_owned());
    }

    get_token_from_cookies(&CookieJar::from_headers(&parts.headers))
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        AppState,
        auth::cookie::COOKIE_TOKEN,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::AuthenticatedUser;

    async fn whoami(AuthenticatedUser(user): AuthenticatedUser) -> Json<String> {
        Json(user.username)
    }

    fn get_server() -> (TestServer, AppState) {
        let connection = get_test_connection();
        create_test_user(&connection, "asha");
        let state = AppState::from_connection(connection, "secret");
        let app = Router::new()
            .route("/whoami", get(whoami))
            .with_state(state.clone());

        (TestServer::try_new(app).unwrap(), state)
    }

    #[tokio::test]
    async fn accepts_bearer_token() {
        let (server, state) = get_server();
        let token = state.token_codec.issue("asha").unwrap();

        let response = server.get("/whoami").authorization_bearer(token).await;

        response.assert_status_ok();
        response.assert_json(&"asha".to_string());
    }

    #[tokio::test]
    async fn accepts_cookie_token() {
        let (server, state) = get_server();
        let token = state.token_codec.issue("asha").unwrap();

        let response = server
            .get("/whoami")
            .add_cookie(Cookie::new(COOKIE_TOKEN, token))
            .await;

        response.assert_status_ok();
        response.assert_json(&"asha".to_string());
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let (server, _) = get_server();

        let response = server.get("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_forged_token() {
        let (server, _) = get_server();
        let token = crate::auth::token::TokenCodec::new("not the secret")
            .issue("asha")
            .unwrap();

        let response = server.get("/whoami").authorization_bearer(token).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

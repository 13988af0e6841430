//! Defines functions for handing session tokens to browsers in a cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::token::TOKEN_LIFETIME;

/// The name of the cookie that holds the session token.
pub(crate) const COOKIE_TOKEN: &str = "authToken";

/// Add the session `token` to the cookie jar.
///
/// The cookie expires together with the token.
pub(crate) fn set_auth_cookie(jar: CookieJar, token: String) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .path("/")
            .max_age(TOKEN_LIFETIME)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the raw session token from the cookie jar, if there is one.
pub(crate) fn get_token_from_cookies(jar: &CookieJar) -> Option<String> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

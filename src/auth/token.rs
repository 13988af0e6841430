//! Signed session tokens (JSON Web Tokens signed with HMAC-SHA256).
//!
//! A token is valid while its signature checks out and its expiry has not
//! passed. Nothing about a token is stored on the server.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// How long a token is valid for after it is issued.
pub const TOKEN_LIFETIME: Duration = Duration::hours(24);

/// The contents of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The username of the user the token was issued to.
    pub sub: String,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies session tokens with a fixed secret.
///
/// Tokens issued before a restart still verify after it as long as the same
/// secret is configured.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec that signs tokens with a key derived from `secret`.
    pub fn new(secret: &str) -> Self {
        let key = Sha512::digest(secret.as_bytes());

        Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
        }
    }

    /// Issue a token for `username` that expires [TOKEN_LIFETIME] from now.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(&self, username: &str) -> Result<String, Error> {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    /// Issue a token for `username` as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue_at(&self, username: &str, now: OffsetDateTime) -> Result<String, Error> {
        let claims = Claims {
            sub: username.to_owned(),
            iat: now.unix_timestamp(),
            exp: (now + TOKEN_LIFETIME).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|error| {
            tracing::error!("Could not sign session token: {error}");
            Error::TokenCreation
        })
    }

    /// Get the username from `token`, or `None` if the token is malformed,
    /// forged or expired.
    pub fn verify(&self, token: &str) -> Option<String> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Get the username from `token` as if the current time were `now`.
    ///
    /// A token is expired from the second of its expiry onwards. There is no
    /// leeway for clock skew.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now` instead of the system clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => token_data.claims,
            Err(error) => {
                tracing::debug!("Rejected session token: {error}");
                return None;
            }
        };

        if claims.exp <= now.unix_timestamp() {
            tracing::debug!("Rejected expired session token for {}", claims.sub);
            return None;
        }

        Some(claims.sub)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

//! Registration, log-in and password changes.

use std::str::FromStr;

use email_address::EmailAddress;
use serde::Deserialize;

use crate::{
    AuthError, Error, PasswordHash, ValidationError,
    auth::token::TokenCodec,
    stores::UserStore,
    user::{NewUser, User},
};

/// The maximum number of characters in a username.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// The details needed to register a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    /// The name the user will log in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's chosen password, in plain text.
    pub password: String,
}

/// A username and password entered at log-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// The name the user registered with.
    pub username: String,
    /// The user's password, in plain text.
    pub password: String,
}

/// A request to replace a user's password.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    /// The user's password before the change.
    pub current_password: String,
    /// The user's new password.
    pub new_password: String,
}

/// Register a new user and issue them a session token.
///
/// Leading and trailing whitespace is removed from the username and email.
/// `cost` is the bcrypt cost used to hash the password.
///
/// # Errors
///
/// Returns:
/// - [ValidationError::InvalidUsername] or [ValidationError::InvalidEmail] for malformed details,
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if either is taken,
/// - [Error::TooWeak] if the password is easy to guess,
/// - [Error::HashingError] or [Error::TokenCreation] if something unexpected fails.
pub fn register(
    registration: Registration,
    users: &mut impl UserStore,
    codec: &TokenCodec,
    cost: u32,
) -> Result<(User, String), Error> {
    let username = registration.username.trim();

    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername.into());
    }

    let email = registration.email.trim();
    let email = EmailAddress::from_str(email)
        .map_err(|_| ValidationError::InvalidEmail(email.to_owned()))?;

    if users.username_exists(username)? {
        return Err(Error::DuplicateUsername);
    }

    if users.email_exists(email.as_str())? {
        return Err(Error::DuplicateEmail);
    }

    let password_hash =
        PasswordHash::from_raw_password(&registration.password, &[username, email.as_str()], cost)?;

    let user = users.create(NewUser {
        username: username.to_owned(),
        email,
        password_hash,
    })?;
    let token = codec.issue(&user.username)?;

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok((user, token))
}

/// Check a user's password and issue them a session token.
///
/// # Errors
///
/// Returns [AuthError::InvalidCredentials] if the username is unknown or the
/// password is wrong. Both cases look the same to the caller.
pub fn log_in(
    credentials: Credentials,
    users: &impl UserStore,
    codec: &TokenCodec,
) -> Result<(User, String), Error> {
    let user = match users.get_by_username(credentials.username.trim()) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::info!("Log-in attempt for unknown user {}", credentials.username);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(error) => return Err(error),
    };

    if !user.password_hash.verify(&credentials.password)? {
        tracing::info!("Wrong password for user {}", user.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = codec.issue(&user.username)?;

    Ok((user, token))
}

/// Replace the password of `user` after checking their current password.
///
/// # Errors
///
/// Returns [AuthError::InvalidCredentials] if `current_password` is wrong, or
/// [Error::TooWeak] if the new password is easy to guess.
pub fn change_password(
    user: &User,
    change: PasswordChange,
    users: &mut impl UserStore,
    cost: u32,
) -> Result<(), Error> {
    if !user.password_hash.verify(&change.current_password)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let password_hash = PasswordHash::from_raw_password(
        &change.new_password,
        &[&user.username, user.email.as_str()],
        cost,
    )?;
    users.set_password(user.id, password_hash)?;

    tracing::info!("Changed password for user {}", user.id);

    Ok(())
}

//! Session tokens, passwords and the checks that scope every request to one user.

mod cookie;
mod credentials;
mod extractor;
mod guard;
mod password;
mod token;

pub(crate) use cookie::{invalidate_auth_cookie, set_auth_cookie};
pub use credentials::{
    Credentials, MAX_USERNAME_LENGTH, PasswordChange, Registration, change_password, log_in,
    register,
};
pub use extractor::AuthenticatedUser;
pub use guard::{assert_owns, resolve_user};
pub use password::{PasswordHash, ValidatedPassword};
pub use token::{Claims, TOKEN_LIFETIME, TokenCodec};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

//! Defines the user store trait.

use rust_decimal::Decimal;

use crate::{
    Error, PasswordHash,
    user::{NewUser, User, UserID},
};

/// Handles the creation, retrieval and modification of users.
pub trait UserStore {
    /// Register a new user.
    ///
    /// Returns [Error::DuplicateUsername] or [Error::DuplicateEmail] if either
    /// is already taken.
    fn create(&mut self, user: NewUser) -> Result<User, Error>;

    /// Get a user by their username.
    ///
    /// Returns [Error::NotFound] if no user with the given username exists.
    fn get_by_username(&self, username: &str) -> Result<User, Error>;

    /// Check whether `username` is taken.
    fn username_exists(&self, username: &str) -> Result<bool, Error>;

    /// Check whether `email` is in use. Emails are compared case-insensitively.
    fn email_exists(&self, email: &str) -> Result<bool, Error>;

    /// Set the budget of the user `id`.
    fn set_budget(&mut self, id: UserID, budget: Decimal) -> Result<(), Error>;

    /// Replace the password hash of the user `id`.
    fn set_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error>;
}

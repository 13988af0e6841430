//! Ties requests to users and keeps each user's expenses to themselves.

use crate::{
    AuthError, Error,
    auth::token::TokenCodec,
    expense::Expense,
    stores::UserStore,
    user::User,
};

/// Find the user that `token` was issued to.
///
/// # Errors
///
/// Returns:
/// - [AuthError::Unauthenticated] if the token is malformed, forged or expired,
/// - [AuthError::UserNotFound] if the token's subject is not a registered user,
/// - any other error from the user store.
pub fn resolve_user(
    token: &str,
    codec: &TokenCodec,
    users: &impl UserStore,
) -> Result<User, Error> {
    let username = codec.verify(token).ok_or(AuthError::Unauthenticated)?;

    match users.get_by_username(&username) {
        Ok(user) => Ok(user),
        Err(Error::NotFound) => {
            tracing::warn!("Valid session token for unknown user {username}");
            Err(AuthError::UserNotFound.into())
        }
        Err(error) => Err(error),
    }
}

/// Check that `expense` was recorded by `user`.
///
/// # Errors
///
/// Returns [Error::Forbidden] if the expense belongs to someone else.
pub fn assert_owns(expense: &Expense, user: &User) -> Result<(), Error> {
    if expense.owner_id == user.id {
        return Ok(());
    }

    tracing::warn!(
        "User {} tried to access expense {} owned by user {}",
        user.id,
        expense.id,
        expense.owner_id
    );

    Err(Error::Forbidden)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        AuthError, Error,
        auth::token::{TOKEN_LIFETIME, TokenCodec},
        stores::{ExpenseStore, sqlite::{SQLiteExpenseStore, SQLiteUserStore}},
        test_utils::{cash_input, create_test_user, get_test_connection, new_expense},
    };

    use super::{assert_owns, resolve_user};

    #[test]
    fn resolves_registered_user() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "asha");
        let codec = TokenCodec::new("secret");
        let token = codec.issue("asha").unwrap();

        let got = resolve_user(&token, &codec, &SQLiteUserStore::new(connection));

        assert_eq!(got, Ok(user));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let connection = get_test_connection();
        create_test_user(&connection, "asha");
        let codec = TokenCodec::new("secret");
        let token = codec
            .issue_at(
                "asha",
                OffsetDateTime::now_utc() - TOKEN_LIFETIME - Duration::seconds(1),
            )
            .unwrap();

        let got = resolve_user(&token, &codec, &SQLiteUserStore::new(connection));

        assert_eq!(got, Err(Error::Auth(AuthError::Unauthenticated)));
    }

    #[test]
    fn token_for_unknown_user_is_rejected() {
        let connection = get_test_connection();
        let codec = TokenCodec::new("secret");
        let token = codec.issue("ghost").unwrap();

        let got = resolve_user(&token, &codec, &SQLiteUserStore::new(connection));

        assert_eq!(got, Err(Error::Auth(AuthError::UserNotFound)));
    }

    #[test]
    fn only_owner_owns_expense() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "asha");
        let other_user = create_test_user(&connection, "bilal");
        let expense = SQLiteExpenseStore::new(connection)
            .create(new_expense(
                &owner,
                cash_input(dec!(10.00), "Food", date!(2024 - 01 - 15)),
            ))
            .unwrap();

        assert_eq!(assert_owns(&expense, &owner), Ok(()));
        assert_eq!(assert_owns(&expense, &other_user), Err(Error::Forbidden));
    }
}

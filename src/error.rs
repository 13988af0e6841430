//! The error types shared by the whole application and how they are rendered
//! as HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent data that does not describe a valid expense, user or query.
    ///
    /// Nothing is written to the database when this error is returned.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be tied to a registered user.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The requested resource exists but belongs to another user.
    ///
    /// At the HTTP boundary this is reported as [StatusCode::NOT_FOUND] so that
    /// clients cannot probe for the IDs of other users' expenses.
    #[error("the requested resource belongs to another user")]
    Forbidden,

    /// A budget must be zero or more.
    #[error("the budget cannot be negative")]
    NegativeBudget,

    /// The username chosen during registration is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The email used during registration is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A session token could not be signed.
    #[error("could not create a session token")]
    TokenCreation,

    /// A total over the user's expenses does not fit in a decimal.
    #[error("the expense totals are too large to compute")]
    AmountOverflow,

    /// Expenses could not be written as CSV.
    #[error("could not export expenses as CSV: {0}")]
    CsvError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

/// The reasons why client supplied data was rejected.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// No amount was given for an expense.
    #[error("amount is required")]
    MissingAmount,

    /// Expenses must have an amount greater than zero.
    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    /// The amount was larger than [crate::expense::MAX_AMOUNT].
    #[error("amount must not exceed 99999999.99")]
    AmountTooLarge,

    /// The category was missing or only contained whitespace.
    #[error("category is required")]
    MissingCategory,

    /// The category was longer than [crate::expense::MAX_CATEGORY_LENGTH] characters.
    #[error("category must not exceed {0} characters")]
    CategoryTooLong(usize),

    /// No date was given for an expense.
    #[error("expense date is required")]
    MissingExpenseDate,

    /// A date could not be parsed, e.g. from a query string.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// No payment method was given for an expense.
    #[error("payment method is required")]
    MissingPaymentMethod,

    /// The payment method was not one of the supported methods.
    #[error("\"{0}\" is not a valid payment method, expected CASH or UPI")]
    InvalidPaymentMethod(String),

    /// UPI payments must record the payee's virtual payment address.
    #[error("UPI VPA is required for UPI payments")]
    MissingUpiVpa,

    /// UPI payments must record the UPI transaction ID.
    #[error("transaction ID is required for UPI payments")]
    MissingTransactionId,

    /// An optional free text field was too long.
    #[error("{field} must not exceed {max} characters")]
    FieldTooLong {
        /// The name of the offending field.
        field: &'static str,
        /// The maximum number of characters allowed.
        max: usize,
    },

    /// Months are numbered 1 to 12.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// The body or query string could not be read into the expected fields,
    /// e.g. a payment method other than CASH or UPI.
    #[error("{0}")]
    MalformedRequest(String),

    /// Usernames must not be blank and must be at most 50 characters.
    #[error("username must be between 1 and 50 characters")]
    InvalidUsername,

    /// The email address could not be parsed.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),
}

/// The reasons why a request could not be authenticated.
///
/// None of these carry the token itself so that it can never end up in a log
/// or response body.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    /// The token was missing, malformed, forged or expired.
    #[error("a valid session token is required")]
    Unauthenticated,

    /// The token was valid but its subject is not a registered user.
    #[error("the user for this session no longer exists")]
    UserNotFound,

    /// The username and password did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::Auth(AuthError::UserNotFound)
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::NegativeBudget | Error::TooWeak(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::Forbidden => StatusCode::NOT_FOUND,
            Error::DuplicateUsername | Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenCreation
            | Error::AmountOverflow
            | Error::CsvError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            // Report other users' expenses exactly like missing ones.
            Error::Forbidden => Error::NotFound.to_string(),
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "an internal server error occurred, check the server logs for more details"
                    .to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

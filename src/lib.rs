//! An expense tracker for people who pay with both cash and UPI.
//!
//! Users register, log in with a session token and record their expenses.
//! Each expense is paid either in cash or through UPI, and the amount is split
//! into a cash bucket and a UPI bucket so that the two can be totalled
//! separately. The library provides a JSON REST API over a SQLite database
//! covering filtering, summaries against a monthly budget, monthly reports
//! and CSV export.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod csv_export;
mod database_id;
mod db;
mod error;
mod expense;
mod filter;
mod lifecycle;
mod logging;
mod routes;
pub mod stores;
mod summary;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthenticatedUser, Claims, Credentials, MAX_USERNAME_LENGTH, PasswordChange, PasswordHash,
    Registration, TOKEN_LIFETIME, TokenCodec, ValidatedPassword, assert_owns, change_password,
    log_in, register, resolve_user,
};
pub use csv_export::{csv_filename, export_expenses_csv};
pub use database_id::{DatabaseId, ExpenseId};
pub use db::initialize as initialize_db;
pub use error::{AuthError, Error, ValidationError};
pub use expense::{
    AmountSplit, Expense, ExpenseDetails, ExpenseInput, MAX_AMOUNT, NewExpense, PaymentMethod,
    derive_amount_split,
};
pub use filter::{FilterCriteria, apply_substring_filters, filter_expenses};
pub use lifecycle::{
    cash_upi_summary, category_summary, create_expense, dashboard_summary, delete_expense,
    distinct_categories, expense_summary, export_csv, get_expense, list_expenses,
    monthly_category_summary, monthly_summary, payment_method_summary, update_budget,
    update_expense,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routes::build_router;
pub use summary::{
    CashUpiTotals, CategoryTotal, Dashboard, MonthlyTotal, PaymentMethodTotal, Summary,
};
pub use user::{NewUser, User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

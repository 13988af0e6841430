//! Application router configuration and the JSON API handlers.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::AppState;

mod auth;
pub(crate) mod endpoints;
mod expenses;
mod extract;
mod reports;
mod users;

/// Return a router with all the app's routes.
///
/// Every route except registration, log-in and log-out requires a session
/// token. The [crate::AuthenticatedUser] extractor enforces this per handler.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(endpoints::REGISTER, post(auth::register_endpoint))
        .route(endpoints::LOG_IN, post(auth::log_in_endpoint))
        .route(endpoints::VALIDATE_TOKEN, post(auth::validate_token_endpoint))
        .route(endpoints::CHANGE_PASSWORD, post(auth::change_password_endpoint))
        .route(endpoints::LOG_OUT, post(auth::log_out_endpoint));

    let expense_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(expenses::list_expenses_endpoint).post(expenses::create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(expenses::get_expense_endpoint)
                .put(expenses::update_expense_endpoint)
                .delete(expenses::delete_expense_endpoint),
        )
        .route(endpoints::EXPENSE_SUMMARY, get(expenses::summary_endpoint))
        .route(
            endpoints::EXPENSE_CATEGORIES,
            get(expenses::categories_endpoint),
        )
        .route(endpoints::EXPORT_CSV, get(expenses::export_csv_endpoint));

    let report_routes = Router::new()
        .route(
            endpoints::MONTHLY_SUMMARY,
            get(reports::monthly_summary_endpoint),
        )
        .route(
            endpoints::MONTHLY_CATEGORY_SUMMARY,
            get(reports::monthly_category_summary_endpoint),
        )
        .route(
            endpoints::CATEGORY_TOTALS,
            get(reports::category_totals_endpoint),
        )
        .route(
            endpoints::PAYMENT_METHOD_TOTALS,
            get(reports::payment_method_totals_endpoint),
        )
        .route(
            endpoints::CASH_UPI_TOTALS,
            get(reports::cash_upi_totals_endpoint),
        )
        .route(endpoints::DASHBOARD, get(reports::dashboard_endpoint));

    auth_routes
        .merge(expense_routes)
        .merge(report_routes)
        .route(endpoints::BUDGET, put(users::update_budget_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "no route matches this path" })),
    )
        .into_response()
}

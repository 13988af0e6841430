//! Handlers for the reports over a user's expenses.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    AppState, AuthenticatedUser, Error,
    lifecycle::{
        cash_upi_summary, category_summary, dashboard_summary, monthly_category_summary,
        monthly_summary, payment_method_summary,
    },
    routes::extract::ApiQuery,
    summary::{CashUpiTotals, CategoryTotal, Dashboard, MonthlyTotal, PaymentMethodTotal},
};

pub(crate) async fn monthly_summary_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    monthly_summary(&user, &state.expense_store()).map(Json)
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthQuery {
    year: i32,
    month: u8,
}

pub(crate) async fn monthly_category_summary_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(MonthQuery { year, month }): ApiQuery<MonthQuery>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    monthly_category_summary(&user, year, month, &state.expense_store()).map(Json)
}

pub(crate) async fn category_totals_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    category_summary(&user, &state.expense_store()).map(Json)
}

pub(crate) async fn payment_method_totals_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<PaymentMethodTotal>>, Error> {
    payment_method_summary(&user, &state.expense_store()).map(Json)
}

pub(crate) async fn cash_upi_totals_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<CashUpiTotals>, Error> {
    cash_upi_summary(&user, &state.expense_store()).map(Json)
}

/// Every report at once, for the client's landing page.
pub(crate) async fn dashboard_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Dashboard>, Error> {
    dashboard_summary(&user, &state.expense_store()).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::{
        expense::PaymentMethod,
        routes::endpoints,
        summary::{CashUpiTotals, CategoryTotal, Dashboard, MonthlyTotal, PaymentMethodTotal},
        test_utils::{assert_json_error, get_test_server, token_for},
    };

    async fn create_cash(server: &TestServer, token: &str, amount: &str, category: &str) {
        server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({
                "amount": amount,
                "category": category,
                "expense_date": "2024-01-15",
                "payment_method": "CASH",
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn monthly_reports() {
        let (server, state) = get_test_server();
        let token = token_for(&state, "asha");
        for (amount, category, date) in [
            ("10.00", "Food", "2024-01-31"),
            ("30.00", "Travel", "2024-01-01"),
            ("5.00", "Food", "2024-02-01"),
        ] {
            server
                .post(endpoints::EXPENSES)
                .authorization_bearer(&token)
                .json(&json!({
                    "amount": amount,
                    "category": category,
                    "expense_date": date,
                    "payment_method": "CASH",
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let months = server
            .get(endpoints::MONTHLY_SUMMARY)
            .authorization_bearer(&token)
            .await
            .json::<Vec<MonthlyTotal>>();
        let january = server
            .get(endpoints::MONTHLY_CATEGORY_SUMMARY)
            .authorization_bearer(&token)
            .add_query_param("year", 2024)
            .add_query_param("month", 1)
            .await
            .json::<Vec<CategoryTotal>>();

        assert_eq!(
            months,
            vec![
                MonthlyTotal {
                    year: 2024,
                    month: 2,
                    total_amount: dec!(5.00),
                    transaction_count: 1,
                },
                MonthlyTotal {
                    year: 2024,
                    month: 1,
                    total_amount: dec!(40.00),
                    transaction_count: 2,
                },
            ]
        );
        assert_eq!(january.len(), 2);
        assert_eq!(january[0].category, "Travel");
        assert_eq!(january[1].total_amount, dec!(10.00));
    }

    #[tokio::test]
    async fn month_out_of_range_is_bad_request() {
        let (server, state) = get_test_server();
        let token = token_for(&state, "asha");

        let response = server
            .get(endpoints::MONTHLY_CATEGORY_SUMMARY)
            .authorization_bearer(&token)
            .add_query_param("year", 2024)
            .add_query_param("month", 13)
            .await;

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_month_is_json_bad_request() {
        let (server, state) = get_test_server();
        let token = token_for(&state, "asha");

        let response = server
            .get(endpoints::MONTHLY_CATEGORY_SUMMARY)
            .authorization_bearer(&token)
            .add_query_param("year", 2024)
            .add_query_param("month", "June")
            .await;

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn all_time_totals() {
        let (server, state) = get_test_server();
        let token = token_for(&state, "asha");
        create_cash(&server, &token, "10.00", "Food").await;
        create_cash(&server, &token, "30.00", "Travel").await;
        server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": "25.00",
                "category": "Food",
                "expense_date": "2024-02-01",
                "payment_method": "UPI",
                "upi_vpa": "cafe@okbank",
                "transaction_id": "TXN42",
            }))
            .await
            .assert_status(StatusCode::CREATED);
        let other_token = token_for(&state, "bilal");
        create_cash(&server, &other_token, "500.00", "Rent").await;

        let categories = server
            .get(endpoints::CATEGORY_TOTALS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<CategoryTotal>>();
        let methods = server
            .get(endpoints::PAYMENT_METHOD_TOTALS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<PaymentMethodTotal>>();
        let buckets = server
            .get(endpoints::CASH_UPI_TOTALS)
            .authorization_bearer(&token)
            .await
            .json::<CashUpiTotals>();

        assert_eq!(
            categories,
            vec![
                CategoryTotal {
                    category: "Food".to_owned(),
                    total_amount: dec!(35.00),
                    transaction_count: 2,
                },
                CategoryTotal {
                    category: "Travel".to_owned(),
                    total_amount: dec!(30.00),
                    transaction_count: 1,
                },
            ]
        );
        assert_eq!(
            methods,
            vec![
                PaymentMethodTotal {
                    payment_method: PaymentMethod::Cash,
                    total_amount: dec!(40.00),
                    transaction_count: 2,
                },
                PaymentMethodTotal {
                    payment_method: PaymentMethod::Upi,
                    total_amount: dec!(25.00),
                    transaction_count: 1,
                },
            ]
        );
        assert_eq!(
            buckets,
            CashUpiTotals {
                total_cash: dec!(40.00),
                total_upi: dec!(25.00),
            }
        );
    }

    #[tokio::test]
    async fn dashboard_combines_reports() {
        let (server, state) = get_test_server();
        let token = token_for(&state, "asha");
        create_cash(&server, &token, "10.00", "Food").await;
        create_cash(&server, &token, "30.00", "Travel").await;

        let response = server
            .get(endpoints::DASHBOARD)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let dashboard = response.json::<Dashboard>();
        assert_eq!(dashboard.summary.total_amount, dec!(40.00));
        assert_eq!(dashboard.summary.total_transactions, 2);
        assert_eq!(
            dashboard.monthly_summary,
            vec![MonthlyTotal {
                year: 2024,
                month: 1,
                total_amount: dec!(40.00),
                transaction_count: 2,
            }]
        );
        assert_eq!(dashboard.category_totals[0].category, "Travel");
        assert_eq!(dashboard.payment_method_totals.len(), 1);
        assert_eq!(dashboard.cash_upi_totals.total_cash, dec!(40.00));
        assert_eq!(dashboard.cash_upi_totals.total_upi, dec!(0));
    }
}

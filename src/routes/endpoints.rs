//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for checking whether a session token is still valid.
pub const VALIDATE_TOKEN: &str = "/api/auth/validate";
/// The route for changing the current user's password.
pub const CHANGE_PASSWORD: &str = "/api/auth/password";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to get, update and delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for the summary of all of the user's expenses.
pub const EXPENSE_SUMMARY: &str = "/api/expenses/summary";
/// The route for the categories the user has used.
pub const EXPENSE_CATEGORIES: &str = "/api/expenses/categories";
/// The route to download expenses as a CSV file.
pub const EXPORT_CSV: &str = "/api/expenses/export/csv";
/// The route to set the user's budget.
pub const BUDGET: &str = "/api/users/budget";
/// The route for the total spent in each month.
pub const MONTHLY_SUMMARY: &str = "/api/reports/monthly-summary";
/// The route for the total spent per category in one month.
pub const MONTHLY_CATEGORY_SUMMARY: &str = "/api/reports/monthly-category-summary";
/// The route for the total spent per category over all time.
pub const CATEGORY_TOTALS: &str = "/api/reports/category-totals";
/// The route for the total spent per payment method.
pub const PAYMENT_METHOD_TOTALS: &str = "/api/reports/payment-method-totals";
/// The route for the sums of the cash and UPI buckets.
pub const CASH_UPI_TOTALS: &str = "/api/reports/cash-upi-totals";
/// The route for every report in one response.
pub const DASHBOARD: &str = "/api/reports/dashboard";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Uri;

    use super::{EXPENSE, EXPENSES, format_endpoint};

    #[test]
    fn formats_parameter() {
        let got = format_endpoint(EXPENSE, 42);

        assert_eq!(got, "/api/expenses/42");
        assert!(got.parse::<Uri>().is_ok());
    }

    #[test]
    fn leaves_plain_path_unchanged() {
        assert_eq!(format_endpoint(EXPENSES, 42), EXPENSES);
    }

    #[test]
    fn formats_parameter_in_middle() {
        assert_eq!(format_endpoint("/a/{id}/b", 7), "/a/7/b");
    }
}

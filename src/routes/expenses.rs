//! Handlers for creating, reading, updating, deleting and exporting expenses.

use axum::{
    Json,
    extract::State,
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, AuthenticatedUser, Error, ValidationError,
    csv_export::csv_filename,
    database_id::ExpenseId,
    expense::{Expense, ExpenseInput, PaymentMethod, parse_date},
    filter::FilterCriteria,
    lifecycle::{
        create_expense, delete_expense, distinct_categories, expense_summary, export_csv,
        get_expense, list_expenses, update_expense,
    },
    routes::{
        endpoints::{self, format_endpoint},
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    summary::Summary,
};

/// The filter criteria as sent in a query string.
///
/// Blank dates and payment methods are treated as missing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FilterQuery {
    category: Option<String>,
    payment_method: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    upi_vpa: Option<String>,
    transaction_id: Option<String>,
}

impl TryFrom<FilterQuery> for FilterCriteria {
    type Error = ValidationError;

    fn try_from(query: FilterQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            category: query.category,
            payment_method: non_blank(query.payment_method)
                .map(|method| method.parse::<PaymentMethod>())
                .transpose()?,
            start_date: non_blank(query.start_date)
                .map(|date| parse_date(&date))
                .transpose()?,
            end_date: non_blank(query.end_date)
                .map(|date| parse_date(&date))
                .transpose()?,
            upi_vpa: query.upi_vpa,
            transaction_id: query.transaction_id,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub(crate) async fn list_expenses_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<Expense>>, Error> {
    let criteria = FilterCriteria::try_from(query)?;

    list_expenses(&criteria, &user, &state.expense_store()).map(Json)
}

pub(crate) async fn create_expense_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<Response, Error> {
    let expense = create_expense(input, &user, &mut state.expense_store())?;
    let location = format_endpoint(endpoints::EXPENSE, expense.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(expense)).into_response())
}

pub(crate) async fn get_expense_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    get_expense(expense_id, &user, &state.expense_store()).map(Json)
}

pub(crate) async fn update_expense_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(expense_id): ApiPath<ExpenseId>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<Json<Expense>, Error> {
    update_expense(expense_id, input, &user, &mut state.expense_store()).map(Json)
}

pub(crate) async fn delete_expense_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<StatusCode, Error> {
    delete_expense(expense_id, &user, &mut state.expense_store())?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn summary_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Summary>, Error> {
    expense_summary(&user, &state.expense_store()).map(Json)
}

pub(crate) async fn categories_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<String>>, Error> {
    distinct_categories(&user, &state.expense_store()).map(Json)
}

/// Download the user's expenses as a CSV file.
///
/// Only the category, payment method and date criteria are applied.
pub(crate) async fn export_csv_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Response, Error> {
    let criteria = FilterCriteria::try_from(query)?;
    let csv = export_csv(&criteria, &user, &state.expense_store())?;
    let filename = csv_filename(OffsetDateTime::now_utc());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

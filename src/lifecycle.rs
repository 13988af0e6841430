//! The operations a signed-in user can perform on their expenses and budget.
//!
//! Every operation takes the already authenticated [User]. Operations on a
//! single expense check ownership before returning or changing it.

use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error, ValidationError,
    auth::assert_owns,
    csv_export::export_expenses_csv,
    database_id::ExpenseId,
    expense::{Expense, ExpenseInput, NewExpense, derive_amount_split, to_money},
    filter::{FilterCriteria, filter_expenses},
    stores::{ExpenseQuery, ExpenseStore, SortOrder, UserStore},
    summary::{
        CashUpiTotals, CategoryTotal, Dashboard, MonthlyTotal, PaymentMethodTotal, Summary,
        build_dashboard, category_totals, category_totals_for_month, monthly_totals,
        payment_method_totals, summarize,
    },
    user::User,
};

/// Record a new expense for `user`.
///
/// # Errors
///
/// Returns a [ValidationError] if `input` does not describe a valid expense.
/// Nothing is stored in that case.
pub fn create_expense(
    input: ExpenseInput,
    user: &User,
    store: &mut impl ExpenseStore,
) -> Result<Expense, Error> {
    let details = input.validate()?;
    let split = derive_amount_split(&details);

    let expense = store.create(NewExpense {
        owner_id: user.id,
        details,
        split,
        created_at: OffsetDateTime::now_utc(),
    })?;

    tracing::info!("User {} created expense {}", user.id, expense.id);

    Ok(expense)
}

/// Replace the fields of the expense `id` with `input`.
///
/// The owner and creation time are kept and the update time is bumped.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense, [Error::Forbidden]
/// if it belongs to someone else, or a [ValidationError] for invalid input.
/// The stored expense is unchanged on error.
pub fn update_expense(
    id: ExpenseId,
    input: ExpenseInput,
    user: &User,
    store: &mut impl ExpenseStore,
) -> Result<Expense, Error> {
    let mut expense = store.get(id)?;
    assert_owns(&expense, user)?;

    expense.details = input.validate()?;
    expense.split = derive_amount_split(&expense.details);
    expense.updated_at = OffsetDateTime::now_utc();

    let expense = store.update(expense)?;

    tracing::info!("User {} updated expense {}", user.id, expense.id);

    Ok(expense)
}

/// Delete the expense `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense or [Error::Forbidden]
/// if it belongs to someone else.
pub fn delete_expense(
    id: ExpenseId,
    user: &User,
    store: &mut impl ExpenseStore,
) -> Result<(), Error> {
    let expense = store.get(id)?;
    assert_owns(&expense, user)?;

    store.delete(id)?;

    tracing::info!("User {} deleted expense {}", user.id, id);

    Ok(())
}

/// Get the expense `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense or [Error::Forbidden]
/// if it belongs to someone else.
pub fn get_expense(
    id: ExpenseId,
    user: &User,
    store: &impl ExpenseStore,
) -> Result<Expense, Error> {
    let expense = store.get(id)?;
    assert_owns(&expense, user)?;

    Ok(expense)
}

/// Get the expenses of `user` that match `criteria`.
pub fn list_expenses(
    criteria: &FilterCriteria,
    user: &User,
    store: &impl ExpenseStore,
) -> Result<Vec<Expense>, Error> {
    filter_expenses(criteria, user.id, store)
}

/// The categories `user` has used, in lexical order.
pub fn distinct_categories(user: &User, store: &impl ExpenseStore) -> Result<Vec<String>, Error> {
    store.distinct_categories(user.id)
}

/// Summarize all of the expenses of `user` against their budget.
pub fn expense_summary(user: &User, store: &impl ExpenseStore) -> Result<Summary, Error> {
    let expenses = store.query(ExpenseQuery::for_owner(user.id))?;

    summarize(&expenses, user.budget)
}

/// Set the budget of `user` and return the stored value.
///
/// The budget is rounded to two decimal places.
///
/// # Errors
///
/// Returns [Error::NegativeBudget] for a budget below zero. The stored budget
/// is unchanged in that case.
pub fn update_budget(
    user: &User,
    new_budget: Decimal,
    users: &mut impl UserStore,
) -> Result<Decimal, Error> {
    if new_budget.is_sign_negative() && !new_budget.is_zero() {
        return Err(Error::NegativeBudget);
    }

    let budget = to_money(new_budget);
    users.set_budget(user.id, budget)?;

    tracing::info!("User {} set their budget to {budget}", user.id);

    Ok(budget)
}

/// The total spent by `user` in each month, newest month first.
pub fn monthly_summary(
    user: &User,
    store: &impl ExpenseStore,
) -> Result<Vec<MonthlyTotal>, Error> {
    let expenses = store.query(ExpenseQuery::for_owner(user.id))?;

    monthly_totals(&expenses)
}

/// The total spent by `user` per category in one calendar month.
///
/// # Errors
///
/// Returns [ValidationError::InvalidMonth] unless `month` is from 1 to 12.
pub fn monthly_category_summary(
    user: &User,
    year: i32,
    month: u8,
    store: &impl ExpenseStore,
) -> Result<Vec<CategoryTotal>, Error> {
    let calendar_month =
        Month::try_from(month).map_err(|_| ValidationError::InvalidMonth(month))?;
    let first_day = Date::from_calendar_date(year, calendar_month, 1)
        .map_err(|_| ValidationError::InvalidDate(format!("{year}-{month:02}-01")))?;
    let last_day = last_day_of_month(first_day)
        .ok_or_else(|| ValidationError::InvalidDate(format!("{year}-{month:02}")))?;

    let expenses = store.query(ExpenseQuery {
        date_range: Some(first_day..=last_day),
        sort_date: Some(SortOrder::Ascending),
        ..ExpenseQuery::for_owner(user.id)
    })?;

    category_totals_for_month(&expenses, year, month)
}

/// The total spent by `user` per category over all time, largest first.
pub fn category_summary(
    user: &User,
    store: &impl ExpenseStore,
) -> Result<Vec<CategoryTotal>, Error> {
    let expenses = store.query(ExpenseQuery::for_owner(user.id))?;

    category_totals(&expenses)
}

/// The total spent by `user` per payment method, largest first.
pub fn payment_method_summary(
    user: &User,
    store: &impl ExpenseStore,
) -> Result<Vec<PaymentMethodTotal>, Error> {
    let expenses = store.query(ExpenseQuery::for_owner(user.id))?;

    payment_method_totals(&expenses)
}

/// The sums of the cash and UPI buckets of `user`.
pub fn cash_upi_summary(user: &User, store: &impl ExpenseStore) -> Result<CashUpiTotals, Error> {
    expense_summary(user, store).map(|summary| CashUpiTotals::from(&summary))
}

/// Every report over the expenses of `user`, read in one query.
pub fn dashboard_summary(user: &User, store: &impl ExpenseStore) -> Result<Dashboard, Error> {
    let expenses = store.query(ExpenseQuery::for_owner(user.id))?;

    build_dashboard(&expenses, user.budget)
}

/// Render the expenses of `user` that match `criteria` as CSV text.
///
/// Only the category, payment method and date criteria are applied.
pub fn export_csv(
    criteria: &FilterCriteria,
    user: &User,
    store: &impl ExpenseStore,
) -> Result<String, Error> {
    let criteria = FilterCriteria {
        upi_vpa: None,
        transaction_id: None,
        ..criteria.clone()
    };
    let expenses = list_expenses(&criteria, user, store)?;

    tracing::info!("User {} exported {} expenses", user.id, expenses.len());

    export_expenses_csv(&expenses)
}

fn last_day_of_month(first_day: Date) -> Option<Date> {
    let next_month = match first_day.month() {
        Month::December => Date::from_calendar_date(first_day.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(first_day.year(), month.next(), 1),
    };

    next_month.ok()?.previous_day()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, ValidationError,
        expense::{ExpenseInput, PaymentMethod},
        filter::FilterCriteria,
        stores::{
            ExpenseStore, UserStore,
            sqlite::{SQLiteExpenseStore, SQLiteUserStore},
        },
        test_utils::{cash_input, create_test_user, get_test_connection, upi_input},
        user::User,
    };

    use super::{
        cash_upi_summary, category_summary, create_expense, dashboard_summary, delete_expense,
        distinct_categories, expense_summary, export_csv, get_expense, list_expenses,
        monthly_category_summary, monthly_summary, payment_method_summary, update_budget,
        update_expense,
    };

    struct Fixture {
        expenses: SQLiteExpenseStore,
        users: SQLiteUserStore,
        owner: User,
        intruder: User,
    }

    fn get_fixture() -> Fixture {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "asha");
        let intruder = create_test_user(&connection, "bilal");

        Fixture {
            expenses: SQLiteExpenseStore::new(connection.clone()),
            users: SQLiteUserStore::new(connection),
            owner,
            intruder,
        }
    }

    #[test]
    fn create_cash_expense() {
        let mut fixture = get_fixture();

        let expense = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();

        assert_eq!(expense.owner_id, fixture.owner.id);
        assert_eq!(expense.split.cash_amount, dec!(100.00));
        assert_eq!(expense.split.upi_amount, dec!(0.00));
        assert_eq!(expense.created_at, expense.updated_at);
    }

    #[test]
    fn create_rejects_upi_without_references() {
        let mut fixture = get_fixture();
        let input = ExpenseInput {
            upi_vpa: None,
            ..upi_input(dec!(10.00), "Food", date!(2024 - 01 - 15), "x@ok", "T1")
        };

        let got = create_expense(input, &fixture.owner, &mut fixture.expenses);

        assert_eq!(got, Err(ValidationError::MissingUpiVpa.into()));
        assert_eq!(
            list_expenses(&FilterCriteria::default(), &fixture.owner, &fixture.expenses),
            Ok(vec![])
        );
    }

    #[test]
    fn update_rederives_split_and_keeps_creation() {
        let mut fixture = get_fixture();
        let original = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();

        let updated = update_expense(
            original.id,
            upi_input(dec!(120.00), "Dining", date!(2024 - 01 - 16), "cafe@okbank", "TXN9"),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.owner_id, original.owner_id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(updated.details.payment_method, PaymentMethod::Upi);
        assert_eq!(updated.split.cash_amount, Decimal::ZERO);
        assert_eq!(updated.split.upi_amount, dec!(120.00));
    }

    #[test]
    fn update_rejects_invalid_input_without_changes() {
        let mut fixture = get_fixture();
        let original = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        let input = ExpenseInput {
            transaction_id: Some(String::new()),
            ..upi_input(dec!(10.00), "Food", date!(2024 - 01 - 15), "x@ok", "T1")
        };

        let got = update_expense(original.id, input, &fixture.owner, &mut fixture.expenses);

        assert_eq!(got, Err(ValidationError::MissingTransactionId.into()));
        assert_eq!(fixture.expenses.get(original.id), Ok(original));
    }

    #[test]
    fn other_users_cannot_touch_expense() {
        let mut fixture = get_fixture();
        let original = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();

        let got = get_expense(original.id, &fixture.intruder, &fixture.expenses);
        assert_eq!(got, Err(Error::Forbidden));

        let got = update_expense(
            original.id,
            cash_input(dec!(1.00), "Stolen", date!(2024 - 01 - 15)),
            &fixture.intruder,
            &mut fixture.expenses,
        );
        assert_eq!(got, Err(Error::Forbidden));

        let got = delete_expense(original.id, &fixture.intruder, &mut fixture.expenses);
        assert_eq!(got, Err(Error::Forbidden));

        assert_eq!(fixture.expenses.get(original.id), Ok(original));
    }

    #[test]
    fn missing_expense_is_not_found() {
        let mut fixture = get_fixture();

        assert_eq!(
            get_expense(42, &fixture.owner, &fixture.expenses),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_expense(42, &fixture.owner, &mut fixture.expenses),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_expense(
                42,
                cash_input(dec!(1.00), "Food", date!(2024 - 01 - 15)),
                &fixture.owner,
                &mut fixture.expenses
            ),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_removes_own_expense() {
        let mut fixture = get_fixture();
        let expense = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();

        delete_expense(expense.id, &fixture.owner, &mut fixture.expenses).unwrap();

        assert_eq!(
            get_expense(expense.id, &fixture.owner, &fixture.expenses),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn food_filter_finds_cash_and_upi_food() {
        let mut fixture = get_fixture();
        let cash_food = create_expense(
            cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        let upi_food = create_expense(
            upi_input(dec!(75.00), "Food", date!(2024 - 01 - 16), "cafe@okbank", "T1"),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        create_expense(
            cash_input(dec!(20.00), "Travel", date!(2024 - 01 - 17)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        let criteria = FilterCriteria {
            category: Some("Food".to_owned()),
            ..Default::default()
        };

        let got = list_expenses(&criteria, &fixture.owner, &fixture.expenses).unwrap();

        assert_eq!(got, vec![cash_food, upi_food]);
    }

    #[test]
    fn summary_uses_budget() {
        let mut fixture = get_fixture();
        create_expense(
            cash_input(dec!(50.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        create_expense(
            upi_input(dec!(100.00), "Travel", date!(2024 - 01 - 16), "rail@okbank", "T1"),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        update_budget(&fixture.owner, dec!(1000), &mut fixture.users).unwrap();
        let owner = fixture.users.get_by_username("asha").unwrap();

        let got = expense_summary(&owner, &fixture.expenses).unwrap();

        assert_eq!(got.total_amount, dec!(150.00));
        assert_eq!(got.total_cash_amount, dec!(50.00));
        assert_eq!(got.total_upi_amount, dec!(100.00));
        assert_eq!(got.total_transactions, 2);
        assert_eq!(got.budget, dec!(1000.00));
        assert_eq!(got.remaining_budget, dec!(850.00));
    }

    #[test]
    fn summary_ignores_other_users() {
        let mut fixture = get_fixture();
        create_expense(
            cash_input(dec!(50.00), "Food", date!(2024 - 01 - 15)),
            &fixture.intruder,
            &mut fixture.expenses,
        )
        .unwrap();

        let got = expense_summary(&fixture.owner, &fixture.expenses).unwrap();

        assert_eq!(got.total_transactions, 0);
        assert_eq!(got.remaining_budget, Decimal::ZERO);
    }

    #[test]
    fn negative_budget_is_rejected_and_not_stored() {
        let mut fixture = get_fixture();
        update_budget(&fixture.owner, dec!(300.00), &mut fixture.users).unwrap();

        let got = update_budget(&fixture.owner, dec!(-5.00), &mut fixture.users);

        assert_eq!(got, Err(Error::NegativeBudget));
        let stored = fixture.users.get_by_username("asha").unwrap().budget;
        assert_eq!(stored, Some(dec!(300.00)));
    }

    #[test]
    fn zero_budget_is_allowed() {
        let mut fixture = get_fixture();

        let got = update_budget(&fixture.owner, dec!(0), &mut fixture.users);

        assert_eq!(got, Ok(dec!(0.00)));
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let mut fixture = get_fixture();
        for category in ["Travel", "Food", "Travel"] {
            create_expense(
                cash_input(dec!(1.00), category, date!(2024 - 01 - 15)),
                &fixture.owner,
                &mut fixture.expenses,
            )
            .unwrap();
        }

        let got = distinct_categories(&fixture.owner, &fixture.expenses).unwrap();

        assert_eq!(got, vec!["Food", "Travel"]);
    }

    #[test]
    fn monthly_reports() {
        let mut fixture = get_fixture();
        for (amount, category, expense_date) in [
            (dec!(10.00), "Food", date!(2024 - 01 - 31)),
            (dec!(30.00), "Travel", date!(2024 - 01 - 01)),
            (dec!(5.00), "Food", date!(2024 - 02 - 01)),
        ] {
            create_expense(
                cash_input(amount, category, expense_date),
                &fixture.owner,
                &mut fixture.expenses,
            )
            .unwrap();
        }

        let months = monthly_summary(&fixture.owner, &fixture.expenses).unwrap();
        let january =
            monthly_category_summary(&fixture.owner, 2024, 1, &fixture.expenses).unwrap();

        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 2));
        assert_eq!(january.len(), 2);
        assert_eq!(january[0].category, "Travel");
        assert_eq!(january[1].total_amount, dec!(10.00));
    }

    #[test]
    fn monthly_category_summary_rejects_bad_month() {
        let fixture = get_fixture();

        for month in [0, 13] {
            let got = monthly_category_summary(&fixture.owner, 2024, month, &fixture.expenses);

            assert_eq!(got, Err(ValidationError::InvalidMonth(month).into()));
        }
    }

    #[test]
    fn export_ignores_substring_criteria() {
        let mut fixture = get_fixture();
        create_expense(
            upi_input(dec!(75.00), "Food", date!(2024 - 01 - 16), "cafe@okbank", "T1"),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        create_expense(
            cash_input(dec!(20.00), "Travel", date!(2024 - 01 - 17)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        let criteria = FilterCriteria {
            category: Some("Food".to_owned()),
            upi_vpa: Some("no-such-vpa".to_owned()),
            ..Default::default()
        };

        let got = export_csv(&criteria, &fixture.owner, &fixture.expenses).unwrap();

        assert_eq!(got.lines().count(), 2);
        assert!(got.contains("cafe@okbank"));
    }

    #[test]
    fn create_rejects_amount_past_limit() {
        let mut fixture = get_fixture();

        let got = create_expense(
            cash_input(Decimal::MAX, "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        );

        assert_eq!(got, Err(ValidationError::AmountTooLarge.into()));
        assert_eq!(
            expense_summary(&fixture.owner, &fixture.expenses).map(|s| s.total_transactions),
            Ok(0)
        );
    }

    #[test]
    fn all_time_reports_are_scoped_to_user() {
        let mut fixture = get_fixture();
        create_expense(
            cash_input(dec!(50.00), "Food", date!(2024 - 01 - 15)),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        create_expense(
            upi_input(dec!(100.00), "Travel", date!(2024 - 02 - 16), "rail@okbank", "T1"),
            &fixture.owner,
            &mut fixture.expenses,
        )
        .unwrap();
        create_expense(
            cash_input(dec!(999.00), "Rent", date!(2024 - 01 - 15)),
            &fixture.intruder,
            &mut fixture.expenses,
        )
        .unwrap();

        let categories = category_summary(&fixture.owner, &fixture.expenses).unwrap();
        let methods = payment_method_summary(&fixture.owner, &fixture.expenses).unwrap();
        let buckets = cash_upi_summary(&fixture.owner, &fixture.expenses).unwrap();
        let dashboard = dashboard_summary(&fixture.owner, &fixture.expenses).unwrap();

        assert_eq!(
            categories
                .iter()
                .map(|total| total.category.as_str())
                .collect::<Vec<_>>(),
            vec!["Travel", "Food"]
        );
        assert_eq!(methods[0].payment_method, PaymentMethod::Upi);
        assert_eq!(methods[1].total_amount, dec!(50.00));
        assert_eq!(buckets.total_cash, dec!(50.00));
        assert_eq!(buckets.total_upi, dec!(100.00));
        assert_eq!(dashboard.summary.total_amount, dec!(150.00));
        assert_eq!(dashboard.monthly_summary.len(), 2);
        assert_eq!(dashboard.category_totals, categories);
        assert_eq!(dashboard.payment_method_totals, methods);
        assert_eq!(dashboard.cash_upi_totals, buckets);
    }
}

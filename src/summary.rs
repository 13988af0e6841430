//! Reduces a user's expenses into totals and breakdowns.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    expense::{Expense, PaymentMethod},
};

/// Totals over a set of expenses, compared against a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// The sum of every expense's amount.
    pub total_amount: Decimal,
    /// The sum of the cash buckets.
    pub total_cash_amount: Decimal,
    /// The sum of the UPI buckets.
    pub total_upi_amount: Decimal,
    /// The number of expenses.
    pub total_transactions: usize,
    /// The total spent per category.
    pub category_totals: BTreeMap<String, Decimal>,
    /// The total spent per payment method, keyed by its display label.
    pub payment_method_totals: BTreeMap<String, Decimal>,
    /// The user's budget, zero if they have not set one.
    pub budget: Decimal,
    /// The budget minus the total amount. Negative when over budget.
    pub remaining_budget: Decimal,
}

/// The total spent in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// The year, e.g. 2024.
    pub year: i32,
    /// The month, from 1 to 12.
    pub month: u8,
    /// The sum of the month's expenses.
    pub total_amount: Decimal,
    /// The number of expenses in the month.
    pub transaction_count: usize,
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the category's expenses.
    pub total_amount: Decimal,
    /// The number of expenses in the category.
    pub transaction_count: usize,
}

/// The total spent with one payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    /// How the expenses were paid.
    pub payment_method: PaymentMethod,
    /// The sum of the expenses paid this way.
    pub total_amount: Decimal,
    /// The number of expenses paid this way.
    pub transaction_count: usize,
}

/// The sums of the cash and UPI buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashUpiTotals {
    /// The sum of the cash buckets.
    pub total_cash: Decimal,
    /// The sum of the UPI buckets.
    pub total_upi: Decimal,
}

impl From<&Summary> for CashUpiTotals {
    fn from(summary: &Summary) -> Self {
        Self {
            total_cash: summary.total_cash_amount,
            total_upi: summary.total_upi_amount,
        }
    }
}

/// Every report over a user's expenses in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// The totals against the budget.
    pub summary: Summary,
    /// The totals per month, newest first.
    pub monthly_summary: Vec<MonthlyTotal>,
    /// The totals per category, largest first.
    pub category_totals: Vec<CategoryTotal>,
    /// The totals per payment method, largest first.
    pub payment_method_totals: Vec<PaymentMethodTotal>,
    /// The cash and UPI bucket sums.
    pub cash_upi_totals: CashUpiTotals,
}

fn add(total: &mut Decimal, amount: Decimal) -> Result<(), Error> {
    *total = total.checked_add(amount).ok_or(Error::AmountOverflow)?;

    Ok(())
}

/// Summarize `expenses` against `budget` in a single pass.
///
/// A missing budget counts as zero.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn summarize(expenses: &[Expense], budget: Option<Decimal>) -> Result<Summary, Error> {
    let budget = budget.unwrap_or(Decimal::ZERO);
    let empty = Summary {
        total_amount: Decimal::ZERO,
        total_cash_amount: Decimal::ZERO,
        total_upi_amount: Decimal::ZERO,
        total_transactions: 0,
        category_totals: BTreeMap::new(),
        payment_method_totals: BTreeMap::new(),
        budget,
        remaining_budget: budget,
    };

    let mut summary = expenses.iter().try_fold(empty, |mut summary, expense| {
        let amount = expense.details.amount;

        add(&mut summary.total_amount, amount)?;
        add(&mut summary.total_cash_amount, expense.split.cash_amount)?;
        add(&mut summary.total_upi_amount, expense.split.upi_amount)?;
        summary.total_transactions += 1;
        add(
            summary
                .category_totals
                .entry(expense.details.category.clone())
                .or_default(),
            amount,
        )?;
        add(
            summary
                .payment_method_totals
                .entry(expense.details.payment_method.label().to_owned())
                .or_default(),
            amount,
        )?;

        Ok::<_, Error>(summary)
    })?;

    summary.remaining_budget = budget
        .checked_sub(summary.total_amount)
        .ok_or(Error::AmountOverflow)?;

    Ok(summary)
}

/// Group `expenses` by the month of their date, newest month first.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn monthly_totals(expenses: &[Expense]) -> Result<Vec<MonthlyTotal>, Error> {
    let totals = expenses.iter().try_fold(
        BTreeMap::<(i32, u8), (Decimal, usize)>::new(),
        |mut totals, expense| {
            let date = expense.details.expense_date;
            let (total, count) = totals
                .entry((date.year(), u8::from(date.month())))
                .or_default();
            add(total, expense.details.amount)?;
            *count += 1;

            Ok::<_, Error>(totals)
        },
    )?;

    Ok(totals
        .into_iter()
        .rev()
        .map(|((year, month), (total_amount, transaction_count))| MonthlyTotal {
            year,
            month,
            total_amount,
            transaction_count,
        })
        .collect())
}

/// Group `expenses` by category.
///
/// Categories are ordered by their total, largest first, with ties broken by
/// the category name.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn category_totals(expenses: &[Expense]) -> Result<Vec<CategoryTotal>, Error> {
    totals_by_category(expenses.iter())
}

/// Group the expenses dated in `year` and `month` by category.
///
/// Ordered like [category_totals].
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn category_totals_for_month(
    expenses: &[Expense],
    year: i32,
    month: u8,
) -> Result<Vec<CategoryTotal>, Error> {
    totals_by_category(expenses.iter().filter(|expense| {
        let date = expense.details.expense_date;
        date.year() == year && u8::from(date.month()) == month
    }))
}

fn totals_by_category<'a>(
    mut expenses: impl Iterator<Item = &'a Expense>,
) -> Result<Vec<CategoryTotal>, Error> {
    let totals = expenses.try_fold(
        BTreeMap::<&str, (Decimal, usize)>::new(),
        |mut totals, expense| {
            let (total, count) = totals
                .entry(expense.details.category.as_str())
                .or_default();
            add(total, expense.details.amount)?;
            *count += 1;

            Ok::<_, Error>(totals)
        },
    )?;

    let mut category_totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total_amount, transaction_count))| CategoryTotal {
            category: category.to_owned(),
            total_amount,
            transaction_count,
        })
        .collect();
    // The sort is stable, so equal totals keep the name order of the map.
    category_totals.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

    Ok(category_totals)
}

/// Group `expenses` by payment method, largest total first.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn payment_method_totals(expenses: &[Expense]) -> Result<Vec<PaymentMethodTotal>, Error> {
    let totals = expenses.iter().try_fold(
        BTreeMap::<PaymentMethod, (Decimal, usize)>::new(),
        |mut totals, expense| {
            let (total, count) = totals.entry(expense.details.payment_method).or_default();
            add(total, expense.details.amount)?;
            *count += 1;

            Ok::<_, Error>(totals)
        },
    )?;

    let mut method_totals: Vec<PaymentMethodTotal> = totals
        .into_iter()
        .map(
            |(payment_method, (total_amount, transaction_count))| PaymentMethodTotal {
                payment_method,
                total_amount,
                transaction_count,
            },
        )
        .collect();
    method_totals.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

    Ok(method_totals)
}

/// Build every report over `expenses` at once.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn build_dashboard(expenses: &[Expense], budget: Option<Decimal>) -> Result<Dashboard, Error> {
    let summary = summarize(expenses, budget)?;
    let cash_upi_totals = CashUpiTotals::from(&summary);

    Ok(Dashboard {
        summary,
        monthly_summary: monthly_totals(expenses)?,
        category_totals: category_totals(expenses)?,
        payment_method_totals: payment_method_totals(expenses)?,
        cash_upi_totals,
    })
}

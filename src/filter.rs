//! Turns sparse filter criteria into a store query.
//!
//! The query is chosen from an ordered table of strategies, the first whose
//! predicate matches the criteria wins. Criteria the store cannot express are
//! applied to the fetched expenses afterwards.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    expense::{Expense, PaymentMethod},
    stores::{ExpenseQuery, ExpenseStore, SortOrder},
    user::UserID,
};

/// The criteria a user can filter their expenses by. Any subset may be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Only expenses with exactly this category. An empty string is still a
    /// constraint.
    pub category: Option<String>,
    /// Only expenses paid this way.
    pub payment_method: Option<PaymentMethod>,
    /// Only expenses on or after this date. Ignored unless `end_date` is set too.
    pub start_date: Option<Date>,
    /// Only expenses on or before this date. Ignored unless `start_date` is set too.
    pub end_date: Option<Date>,
    /// Only expenses whose UPI VPA contains this text, ignoring case.
    pub upi_vpa: Option<String>,
    /// Only expenses whose transaction ID contains this text, ignoring case.
    pub transaction_id: Option<String>,
}

impl FilterCriteria {
    /// Whether any criterion is set, even to a blank value.
    pub fn has_filters(&self) -> bool {
        self.category.is_some()
            || self.payment_method.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.upi_vpa.is_some()
            || self.transaction_id.is_some()
    }

    /// The inclusive date range, if both bounds are set.
    pub fn date_range(&self) -> Option<RangeInclusive<Date>> {
        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) => Some(start_date..=end_date),
            _ => None,
        }
    }
}

/// A store query plus the criteria to apply to its results in memory.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryPlan {
    pub(crate) query: ExpenseQuery,
    pub(crate) payment_method_filter: Option<PaymentMethod>,
}

impl QueryPlan {
    fn new(query: ExpenseQuery) -> Self {
        Self {
            query,
            payment_method_filter: None,
        }
    }
}

struct Strategy {
    name: &'static str,
    applies: fn(&FilterCriteria) -> bool,
    plan: fn(&FilterCriteria, UserID) -> QueryPlan,
}

static STRATEGIES: [Strategy; 9] = [
    Strategy {
        name: "all",
        applies: |criteria| !criteria.has_filters(),
        plan: all_by_date_descending,
    },
    Strategy {
        name: "date range, category and payment method",
        applies: |criteria| {
            criteria.date_range().is_some()
                && criteria.category.is_some()
                && criteria.payment_method.is_some()
        },
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                category: criteria.category.clone(),
                payment_method: criteria.payment_method,
                date_range: criteria.date_range(),
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "date range and category",
        applies: |criteria| criteria.date_range().is_some() && criteria.category.is_some(),
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                category: criteria.category.clone(),
                date_range: criteria.date_range(),
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "date range and payment method",
        applies: |criteria| criteria.date_range().is_some() && criteria.payment_method.is_some(),
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                payment_method: criteria.payment_method,
                date_range: criteria.date_range(),
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "date range",
        applies: |criteria| criteria.date_range().is_some(),
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                date_range: criteria.date_range(),
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "category then payment method",
        applies: |criteria| criteria.category.is_some() && criteria.payment_method.is_some(),
        plan: |criteria, owner_id| QueryPlan {
            query: ExpenseQuery {
                category: criteria.category.clone(),
                ..ExpenseQuery::for_owner(owner_id)
            },
            payment_method_filter: criteria.payment_method,
        },
    },
    Strategy {
        name: "category",
        applies: |criteria| criteria.category.is_some(),
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                category: criteria.category.clone(),
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "payment method",
        applies: |criteria| criteria.payment_method.is_some(),
        plan: |criteria, owner_id| {
            QueryPlan::new(ExpenseQuery {
                payment_method: criteria.payment_method,
                ..ExpenseQuery::for_owner(owner_id)
            })
        },
    },
    Strategy {
        name: "all (substring or single date bound only)",
        applies: |_| true,
        plan: all_by_date_descending,
    },
];

fn all_by_date_descending(_: &FilterCriteria, owner_id: UserID) -> QueryPlan {
    QueryPlan::new(ExpenseQuery {
        sort_date: Some(SortOrder::Descending),
        ..ExpenseQuery::for_owner(owner_id)
    })
}

/// Choose the store query for `criteria`.
pub(crate) fn plan_query(criteria: &FilterCriteria, owner_id: UserID) -> QueryPlan {
    let strategy = STRATEGIES
        .iter()
        .find(|strategy| (strategy.applies)(criteria))
        // The last strategy always applies.
        .unwrap_or(&STRATEGIES[STRATEGIES.len() - 1]);

    tracing::debug!("Filtering expenses of user {owner_id} by {}", strategy.name);

    (strategy.plan)(criteria, owner_id)
}

/// Get the expenses of `owner_id` that match `criteria`.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub fn filter_expenses(
    criteria: &FilterCriteria,
    owner_id: UserID,
    store: &impl ExpenseStore,
) -> Result<Vec<Expense>, Error> {
    let plan = plan_query(criteria, owner_id);
    let mut expenses = store.query(plan.query)?;

    if let Some(payment_method) = plan.payment_method_filter {
        expenses.retain(|expense| expense.details.payment_method == payment_method);
    }

    Ok(apply_substring_filters(
        expenses,
        criteria.upi_vpa.as_deref(),
        criteria.transaction_id.as_deref(),
    ))
}

/// Keep the expenses whose UPI VPA and transaction ID contain the given text,
/// ignoring case.
///
/// A missing or blank filter matches every expense. Expenses without the
/// field never match a non-blank filter. The relative order of `expenses` is kept.
pub fn apply_substring_filters(
    mut expenses: Vec<Expense>,
    upi_vpa: Option<&str>,
    transaction_id: Option<&str>,
) -> Vec<Expense> {
    if let Some(needle) = non_blank_lowercase(upi_vpa) {
        expenses.retain(|expense| {
            contains_ignoring_case(expense.details.upi_vpa.as_deref(), &needle)
        });
    }

    if let Some(needle) = non_blank_lowercase(transaction_id) {
        expenses.retain(|expense| {
            contains_ignoring_case(expense.details.transaction_id.as_deref(), &needle)
        });
    }

    expenses
}

fn non_blank_lowercase(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|filter| !filter.is_empty())
        .map(str::to_lowercase)
}

fn contains_ignoring_case(haystack: Option<&str>, lowercase_needle: &str) -> bool {
    haystack.is_some_and(|haystack| haystack.to_lowercase().contains(lowercase_needle))
}

//! Defines the expense store trait.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    database_id::ExpenseId,
    expense::{Expense, NewExpense, PaymentMethod},
    user::UserID,
};

/// Handles the creation, retrieval and modification of expenses.
pub trait ExpenseStore {
    /// Add a new expense to the store and give it an ID.
    fn create(&mut self, expense: NewExpense) -> Result<Expense, Error>;

    /// Overwrite the stored expense that has the ID of `expense`.
    ///
    /// Returns [Error::NotFound] if there is no expense with that ID.
    fn update(&mut self, expense: Expense) -> Result<Expense, Error>;

    /// Retrieve an expense by its ID.
    ///
    /// Returns [Error::NotFound] if there is no expense with that ID.
    fn get(&self, id: ExpenseId) -> Result<Expense, Error>;

    /// Remove an expense from the store.
    ///
    /// Returns [Error::NotFound] if there is no expense with that ID.
    fn delete(&mut self, id: ExpenseId) -> Result<(), Error>;

    /// Check whether there is an expense with the ID `id`.
    fn exists(&self, id: ExpenseId) -> Result<bool, Error>;

    /// Retrieve expenses from the store in the way defined by `query`.
    fn query(&self, query: ExpenseQuery) -> Result<Vec<Expense>, Error>;

    /// The distinct categories used by `owner_id`, in lexical order.
    fn distinct_categories(&self, owner_id: UserID) -> Result<Vec<String>, Error>;
}

/// Defines which expenses [ExpenseStore::query] returns and in what order.
///
/// Every query is scoped to a single owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    /// Only include expenses recorded by this user.
    pub owner_id: UserID,
    /// Only include expenses with exactly this category.
    pub category: Option<String>,
    /// Only include expenses paid this way.
    pub payment_method: Option<PaymentMethod>,
    /// Include expenses within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Orders expenses by date in the order `sort_date`. None returns expenses in the
    /// order they were created.
    pub sort_date: Option<SortOrder>,
}

impl ExpenseQuery {
    /// A query for every expense of `owner_id` in creation order.
    pub fn for_owner(owner_id: UserID) -> Self {
        Self {
            owner_id,
            category: None,
            payment_method: None,
            date_range: None,
            sort_date: None,
        }
    }
}

/// The order to sort expenses in an [ExpenseQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

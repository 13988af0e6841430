//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of an [Expense](crate::expense::Expense) row.
pub type ExpenseId = DatabaseId;

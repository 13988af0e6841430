//! SQLite implementations of the [ExpenseStore](super::ExpenseStore) and
//! [UserStore](super::UserStore) traits.
//!
//! The stores share one connection behind a mutex and take the lock for a
//! single statement at a time.

mod expense;
mod user;

pub use expense::SQLiteExpenseStore;
pub use user::SQLiteUserStore;

//! Contains traits and implementations for objects that store expenses and users.

mod expense;
mod user;

pub mod sqlite;

pub use expense::{ExpenseQuery, ExpenseStore, SortOrder};
pub use user::UserStore;

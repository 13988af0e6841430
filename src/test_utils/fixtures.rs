use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, macros::datetime};

use crate::{
    PasswordHash,
    db::initialize,
    expense::{ExpenseInput, NewExpense, PaymentMethod, derive_amount_split},
    stores::{UserStore, sqlite::SQLiteUserStore},
    user::{NewUser, User},
};

/// An in-memory database with the application's tables.
pub(crate) fn get_test_connection() -> Arc<Mutex<Connection>> {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();

    Arc::new(Mutex::new(connection))
}

/// Register `username` with a placeholder password hash.
pub(crate) fn create_test_user(connection: &Arc<Mutex<Connection>>, username: &str) -> User {
    SQLiteUserStore::new(connection.clone())
        .create(NewUser {
            username: username.to_owned(),
            email: EmailAddress::new_unchecked(format!("{username}@example.com")),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        })
        .unwrap()
}

pub(crate) fn cash_input(amount: Decimal, category: &str, expense_date: Date) -> ExpenseInput {
    ExpenseInput {
        amount: Some(amount),
        category: Some(category.to_owned()),
        expense_date: Some(expense_date),
        payment_method: Some(PaymentMethod::Cash),
        ..Default::default()
    }
}

pub(crate) fn upi_input(
    amount: Decimal,
    category: &str,
    expense_date: Date,
    upi_vpa: &str,
    transaction_id: &str,
) -> ExpenseInput {
    ExpenseInput {
        amount: Some(amount),
        category: Some(category.to_owned()),
        expense_date: Some(expense_date),
        payment_method: Some(PaymentMethod::Upi),
        upi_vpa: Some(upi_vpa.to_owned()),
        transaction_id: Some(transaction_id.to_owned()),
        ..Default::default()
    }
}

/// Validate `input` into a [NewExpense] owned by `owner`.
pub(crate) fn new_expense(owner: &User, input: ExpenseInput) -> NewExpense {
    let details = input.validate().unwrap();
    let split = derive_amount_split(&details);

    NewExpense {
        owner_id: owner.id,
        details,
        split,
        created_at: datetime!(2024-01-31 12:00:00 UTC),
    }
}

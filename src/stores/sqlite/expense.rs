//! Implements a SQLite backed expense store.
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    database_id::ExpenseId,
    db::{CreateTable, MapRow, get_decimal},
    expense::{AmountSplit, Expense, ExpenseDetails, NewExpense},
    stores::{ExpenseQuery, ExpenseStore, SortOrder},
    user::UserID,
};

const EXPENSE_COLUMNS: &str = "id, owner_id, amount, category, expense_date, payment_method, \
    cash_amount, upi_amount, upi_vpa, transaction_id, payer_name, notes, created_at, updated_at";

/// Stores expenses in a SQLite database.
///
/// Expenses reference their owner, so the user table must be set up in the
/// same database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Insert a new expense into the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Auth] if the owner is not a registered user,
    /// - [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, expense: NewExpense) -> Result<Expense, Error> {
        let NewExpense {
            owner_id,
            details,
            split,
            created_at,
        } = expense;

        self.lock()?
            .prepare(&format!(
                "INSERT INTO expense (owner_id, amount, category, expense_date, payment_method,
                    cash_amount, upi_amount, upi_vpa, transaction_id, payer_name, notes,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
                 RETURNING {EXPENSE_COLUMNS}"
            ))?
            .query_row(
                params![
                    owner_id.as_i64(),
                    details.amount.to_string(),
                    details.category,
                    details.expense_date,
                    details.payment_method,
                    split.cash_amount.to_string(),
                    split.upi_amount.to_string(),
                    details.upi_vpa,
                    details.transaction_id,
                    details.payer_name,
                    details.notes,
                    created_at,
                ],
                Self::map_row,
            )
            .map_err(Error::from)
    }

    /// Overwrite the mutable fields of an expense.
    ///
    /// The owner and creation time in the database are never changed.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `expense.id` does not refer to a stored expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, expense: Expense) -> Result<Expense, Error> {
        let Expense {
            id,
            details,
            split,
            updated_at,
            ..
        } = expense;

        self.lock()?
            .prepare(&format!(
                "UPDATE expense
                 SET amount = ?2, category = ?3, expense_date = ?4, payment_method = ?5,
                    cash_amount = ?6, upi_amount = ?7, upi_vpa = ?8, transaction_id = ?9,
                    payer_name = ?10, notes = ?11, updated_at = ?12
                 WHERE id = ?1
                 RETURNING {EXPENSE_COLUMNS}"
            ))?
            .query_row(
                params![
                    id,
                    details.amount.to_string(),
                    details.category,
                    details.expense_date,
                    details.payment_method,
                    split.cash_amount.to_string(),
                    split.upi_amount.to_string(),
                    details.upi_vpa,
                    details.transaction_id,
                    details.payer_name,
                    details.notes,
                    updated_at,
                ],
                Self::map_row,
            )
            .map_err(Error::from)
    }

    /// Retrieve an expense in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a stored expense,
    /// - or [Error::SqlError] there is some other SQL error.
    fn get(&self, id: ExpenseId) -> Result<Expense, Error> {
        self.lock()?
            .prepare(&format!("SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id"))?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(Error::from)
    }

    fn delete(&mut self, id: ExpenseId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM expense WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn exists(&self, id: ExpenseId) -> Result<bool, Error> {
        self.lock()?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM expense WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    /// Query for expenses in the database.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is a SQL error.
    fn query(&self, query: ExpenseQuery) -> Result<Vec<Expense>, Error> {
        let mut query_string_parts = vec![format!("SELECT {EXPENSE_COLUMNS} FROM expense")];
        let mut where_clause_parts = vec!["owner_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(query.owner_id.as_i64())];

        if let Some(category) = query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category));
        }

        if let Some(payment_method) = query.payment_method {
            where_clause_parts.push(format!(
                "payment_method = ?{}",
                query_parameters.len() + 1
            ));
            query_parameters.push(Value::Text(payment_method.as_str().to_owned()));
        }

        if let Some(date_range) = query.date_range {
            where_clause_parts.push(format!(
                "expense_date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Text(date_range.start().to_string()));
            query_parameters.push(Value::Text(date_range.end().to_string()));
        }

        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));

        match query.sort_date {
            Some(SortOrder::Ascending) => {
                query_string_parts.push("ORDER BY expense_date ASC, id ASC".to_owned())
            }
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY expense_date DESC, id DESC".to_owned())
            }
            None => query_string_parts.push("ORDER BY id ASC".to_owned()),
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.lock()?
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::from))
            .collect()
    }

    fn distinct_categories(&self, owner_id: UserID) -> Result<Vec<String>, Error> {
        self.lock()?
            .prepare(
                "SELECT DISTINCT category FROM expense WHERE owner_id = ?1 ORDER BY category ASC",
            )?
            .query_map([owner_id.as_i64()], |row| row.get(0))?
            .map(|maybe_category| maybe_category.map_err(Error::from))
            .collect()
    }
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id INTEGER NOT NULL,
                    amount TEXT NOT NULL,
                    category TEXT NOT NULL,
                    expense_date TEXT NOT NULL,
                    payment_method TEXT NOT NULL,
                    cash_amount TEXT NOT NULL,
                    upi_amount TEXT NOT NULL,
                    upi_vpa TEXT,
                    transaction_id TEXT,
                    payer_name TEXT,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS expense_owner_date ON expense(owner_id, expense_date)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let details = ExpenseDetails {
            amount: get_decimal(row, offset + 2)?,
            category: row.get(offset + 3)?,
            expense_date: row.get(offset + 4)?,
            payment_method: row.get(offset + 5)?,
            upi_vpa: row.get(offset + 8)?,
            transaction_id: row.get(offset + 9)?,
            payer_name: row.get(offset + 10)?,
            notes: row.get(offset + 11)?,
        };
        let split = AmountSplit {
            cash_amount: get_decimal(row, offset + 6)?,
            upi_amount: get_decimal(row, offset + 7)?,
        };

        Ok(Expense {
            id: row.get(offset)?,
            owner_id: UserID::new(row.get(offset + 1)?),
            details,
            split,
            created_at: row.get(offset + 12)?,
            updated_at: row.get(offset + 13)?,
        })
    }
}

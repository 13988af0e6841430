/*! This module defines and implements traits for interacting with the application's database. */

use std::str::FromStr;

use rusqlite::{Connection, Error, Row, types::Type};
use rust_decimal::Decimal;

use crate::stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
///
/// # Examples
/// ```ignore
/// use rusqlite::{Connection, Error, Row};
///
/// struct Foo {
///     id: i64,
///     desc: String
/// }
///
/// impl MapRow for Foo {
///     type ReturnType = Self;
///
///     fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, Error> {
///         Ok(Self {
///             id: row.get(offset)?,
///             desc: row.get(offset + 1)?,
///         })
///     }
/// }
///
/// fn get_foo(conn: &Connection) -> Result<Foo, Error> {
///     conn.prepare("SELECT id, desc FROM foo WHERE id = :id")?
///         .query_row(&[(":id", &1)], Foo::map_row)
/// }
/// ```
pub trait MapRow {
    /// The type constructed from a row.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type.
    ///
    /// The `offset` indicates which column the row should be read from.
    /// This is useful in cases where tables have been joined and you want to construct two different types from the one query.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, Error>;
}

/// Create the tables for the application's models.
///
/// Foreign key enforcement is switched on for `connection` so that expenses
/// cannot reference users that do not exist.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    SQLiteUserStore::create_table(connection)?;
    SQLiteExpenseStore::create_table(connection)?;

    Ok(())
}

/// Read a decimal stored as text from column `index`.
///
/// Decimals are stored as text so that amounts are never rounded by a
/// floating point column.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw)
        .map_err(|error| Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Read an optional decimal stored as text from column `index`.
pub(crate) fn get_optional_decimal(row: &Row, index: usize) -> Result<Option<Decimal>, Error> {
    let raw: Option<String> = row.get(index)?;

    raw.map(|raw| {
        Decimal::from_str(&raw)
            .map_err(|error| Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
    })
    .transpose()
}

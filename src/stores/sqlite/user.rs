//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex, MutexGuard};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;

use crate::{
    Error, PasswordHash,
    db::{CreateTable, MapRow, get_optional_decimal},
    stores::UserStore,
    user::{NewUser, User, UserID},
};

/// Handles the creation and retrieval of User objects.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns a [Error::DuplicateUsername] or [Error::DuplicateEmail] if the
    /// username or email is taken, or [Error::SqlError] if another SQL related
    /// error occurred.
    fn create(&mut self, user: NewUser) -> Result<User, Error> {
        self.lock()?
            .prepare(
                "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)
                 RETURNING id, username, email, password, budget",
            )?
            .query_row(
                (
                    &user.username,
                    user.email.as_str(),
                    user.password_hash.as_str(),
                ),
                Self::map_row,
            )
            .map_err(Error::from)
    }

    /// Get the user from the database that has the specified `username`, or
    /// return [Error::NotFound] if such user does not exist.
    fn get_by_username(&self, username: &str) -> Result<User, Error> {
        self.lock()?
            .prepare(
                "SELECT id, username, email, password, budget FROM user WHERE username = :username",
            )?
            .query_row(&[(":username", &username)], Self::map_row)
            .map_err(Error::from)
    }

    fn username_exists(&self, username: &str) -> Result<bool, Error> {
        self.lock()?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM user WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn email_exists(&self, email: &str) -> Result<bool, Error> {
        self.lock()?
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    /// Set the budget of the user `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if there is no user with the ID `id`.
    fn set_budget(&mut self, id: UserID, budget: Decimal) -> Result<(), Error> {
        let rows_affected = self.lock()?.execute(
            "UPDATE user SET budget = ?2 WHERE id = ?1",
            (id.as_i64(), budget.to_string()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Replace the password hash of the user `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if there is no user with the ID `id`.
    fn set_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error> {
        let rows_affected = self.lock()?.execute(
            "UPDATE user SET password = ?2 WHERE id = ?1",
            (id.as_i64(), password_hash.as_str()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY,
                    username TEXT UNIQUE NOT NULL,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    password TEXT NOT NULL,
                    budget TEXT
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;

        Ok(User {
            id: UserID::new(row.get(offset)?),
            username: row.get(offset + 1)?,
            email: EmailAddress::new_unchecked(raw_email),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            budget: get_optional_decimal(row, offset + 4)?,
        })
    }
}

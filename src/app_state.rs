//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error, PasswordHash,
    auth::TokenCodec,
    db::initialize,
    stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs and checks the session tokens handed out at log-in.
    pub token_codec: TokenCodec,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `token_secret` is the key session tokens are signed with.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, token_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self::from_connection(
            Arc::new(Mutex::new(db_connection)),
            token_secret,
        ))
    }

    /// Create a new [AppState] around a shared connection to a database that
    /// has already been initialized.
    pub fn from_connection(db_connection: Arc<Mutex<Connection>>, token_secret: &str) -> Self {
        Self {
            token_codec: TokenCodec::new(token_secret),
            password_cost: PasswordHash::DEFAULT_COST,
            db_connection,
        }
    }

    /// The store for expenses, backed by the shared connection.
    pub fn expense_store(&self) -> SQLiteExpenseStore {
        SQLiteExpenseStore::new(self.db_connection.clone())
    }

    /// The store for users, backed by the shared connection.
    pub fn user_store(&self) -> SQLiteUserStore {
        SQLiteUserStore::new(self.db_connection.clone())
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        state.token_codec.clone()
    }
}

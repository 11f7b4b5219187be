//! Defines the endpoint for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::core::{Account, AccountType},
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name. Must be unique.
    pub name: String,
    /// What kind of account this is.
    pub account_type: AccountType,
    /// The starting balance. Defaults to zero.
    #[serde(default)]
    pub balance: f64,
    /// An optional display color.
    #[serde(default)]
    pub color: Option<String>,
}

/// A route handler for creating a new account.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Json(form): Json<AccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_account(&form, &connection) {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(error) => {
            tracing::warn!("could not create account with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Create an account with an initial balance.
///
/// # Errors
/// Returns:
/// - [Error::MissingField] if the name is empty,
/// - [Error::InvalidAmount] if the balance is not a finite number,
/// - [Error::DuplicateAccountName] if the name is already taken.
pub fn create_account(form: &AccountForm, connection: &Connection) -> Result<Account, Error> {
    if form.name.trim().is_empty() {
        return Err(Error::MissingField("name"));
    }

    if !form.balance.is_finite() {
        return Err(Error::InvalidAmount(form.balance));
    }

    connection
        .execute(
            "INSERT INTO account (name, account_type, balance, color) VALUES (?1, ?2, ?3, ?4)",
            params![
                form.name,
                form.account_type.as_str(),
                form.balance,
                form.color
            ],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(form.name.clone())
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: form.name.clone(),
        account_type: form.account_type,
        balance: form.balance,
        color: form.color.clone(),
    })
}

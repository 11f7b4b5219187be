//! Defines the endpoint for editing an account's details.
//!
//! The balance is deliberately not editable here: balances only move
//! through ledger operations so that they stay consistent with the
//! transaction history.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::core::{Account, AccountId, AccountType, get_account},
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for editing an account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountForm {
    /// The new account name.
    pub name: String,
    /// The new account type.
    pub account_type: AccountType,
    /// The new display color.
    #[serde(default)]
    pub color: Option<String>,
}

/// A route handler for updating an account's name, type, and color.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<UpdateAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_account(account_id, &form, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => {
            tracing::warn!("could not update account {account_id} with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Update the account's name, type, and color. The balance is untouched.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if `id` does not refer to an
/// account, or [Error::DuplicateAccountName] if the new name is taken.
pub fn update_account(
    id: AccountId,
    form: &UpdateAccountForm,
    connection: &Connection,
) -> Result<Account, Error> {
    if form.name.trim().is_empty() {
        return Err(Error::MissingField("name"));
    }

    let rows_affected = connection
        .execute(
            "UPDATE account SET name = ?1, account_type = ?2, color = ?3 WHERE id = ?4",
            params![form.name, form.account_type.as_str(), form.color, id],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(form.name.clone())
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    get_account(id, connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{
            core::AccountType,
            create_endpoint::{AccountForm, create_account},
        },
        db::initialize,
    };

    use super::{UpdateAccountForm, update_account};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn updates_name_and_type_but_not_balance() {
        let connection = get_test_connection();
        let account = create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                balance: 55.0,
                color: None,
            },
            &connection,
        )
        .unwrap();

        let updated = update_account(
            account.id,
            &UpdateAccountForm {
                name: "Emergency Fund".to_owned(),
                account_type: AccountType::Savings,
                color: Some("#2196f3".to_owned()),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Emergency Fund");
        assert_eq!(updated.account_type, AccountType::Savings);
        assert_eq!(updated.balance, 55.0);
    }

    #[test]
    fn updating_missing_account_fails() {
        let connection = get_test_connection();

        let result = update_account(
            1337,
            &UpdateAccountForm {
                name: "Ghost".to_owned(),
                account_type: AccountType::Other,
                color: None,
            },
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingAccount));
    }
}

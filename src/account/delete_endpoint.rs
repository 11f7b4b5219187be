//! Defines the endpoint for deleting an account.
//!
//! Deletion is refused while any transaction still references the account,
//! otherwise the balance invariant could no longer be audited against the
//! transaction history.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::core::{AccountId, account_has_transactions},
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_account(account_id, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            tracing::warn!("could not delete account {account_id}: {error}");
            error.into_response()
        }
    }
}

/// Delete the account `id` if no transaction references it.
///
/// # Errors
/// Returns [Error::AccountInUse] while transactions still reference the
/// account, or [Error::DeleteMissingAccount] if it does not exist.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    if account_has_transactions(id, connection)? {
        return Err(Error::AccountInUse(id));
    }

    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", params![id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

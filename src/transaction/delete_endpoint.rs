//! Defines the endpoint for deleting a transaction.
//!
//! Deleting reverses the transaction's balance effect exactly, so an add
//! followed by a delete is balance-neutral.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::{Account, apply_balance_delta, get_account},
    sync::enqueue_sync_event,
    transaction::core::{TransactionId, get_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with the owning
/// account after the reversal.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_transaction(transaction_id, &mut connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => {
            tracing::warn!("could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}

/// Delete the transaction `id` and apply the inverse of its original delta
/// to the owning account, in one SQL transaction.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a
/// transaction.
pub fn delete_transaction(
    id: TransactionId,
    connection: &mut Connection,
) -> Result<Account, Error> {
    let transaction = get_transaction(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingTransaction,
        error => error,
    })?;

    let sql_transaction = connection.transaction()?;

    sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", params![id])?;
    apply_balance_delta(
        transaction.account_id,
        -transaction.signed_delta(),
        &sql_transaction,
    )?;
    enqueue_sync_event("transaction.deleted", &transaction, &sql_transaction)?;
    let account = get_account(transaction.account_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(account)
}

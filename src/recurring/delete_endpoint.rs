//! Defines the endpoint for deleting a recurring transaction.
//!
//! Deleting a definition only stops future occurrences; transactions it
//! already materialized stay in the ledger. Deleting one leg of a recurring
//! transfer deletes both definitions of the pair.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    recurring::core::{RecurringTransactionId, get_recurring_transaction},
};

/// The state needed to delete a recurring transaction.
#[derive(Debug, Clone)]
pub struct DeleteRecurringState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a recurring transaction.
pub async fn delete_recurring_endpoint(
    State(state): State<DeleteRecurringState>,
    Path(definition_id): Path<RecurringTransactionId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_recurring_transaction(definition_id, &mut connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            tracing::warn!("could not delete recurring transaction {definition_id}: {error}");
            error.into_response()
        }
    }
}

/// Delete the definition `id`, and its paired definition when it belongs to
/// a recurring transfer. Already-materialized transactions are untouched.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a definition.
pub fn delete_recurring_transaction(
    id: RecurringTransactionId,
    connection: &mut Connection,
) -> Result<(), Error> {
    let definition = get_recurring_transaction(id, connection)?;

    let sql_transaction = connection.transaction()?;

    match &definition.transfer_group_id {
        Some(transfer_group_id) => {
            sql_transaction.execute(
                "DELETE FROM recurring_transaction WHERE transfer_group_id = ?1",
                params![transfer_group_id],
            )?;
        }
        None => {
            sql_transaction.execute(
                "DELETE FROM recurring_transaction WHERE id = ?1",
                params![id],
            )?;
        }
    }

    sql_transaction.commit()?;

    Ok(())
}

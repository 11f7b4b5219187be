//! Defines the endpoint for pausing and resuming a recurring transaction.
//!
//! Toggling a definition that belongs to a recurring transfer toggles both
//! definitions of the pair, so the two legs can never drift out of step.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    recurring::core::{RecurringTransaction, RecurringTransactionId, get_recurring_transaction},
};

/// The state needed to toggle a recurring transaction.
#[derive(Debug, Clone)]
pub struct ToggleRecurringState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ToggleRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for toggling a recurring transaction between active and
/// paused. Responds with the definition in its new state.
pub async fn toggle_recurring_endpoint(
    State(state): State<ToggleRecurringState>,
    Path(definition_id): Path<RecurringTransactionId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match toggle_recurring_transaction(definition_id, &mut connection) {
        Ok(definition) => Json(definition).into_response(),
        Err(error) => {
            tracing::warn!("could not toggle recurring transaction {definition_id}: {error}");
            error.into_response()
        }
    }
}

/// Flip the active flag of the definition `id`, and of its paired
/// definition when it belongs to a recurring transfer.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a definition.
pub fn toggle_recurring_transaction(
    id: RecurringTransactionId,
    connection: &mut Connection,
) -> Result<RecurringTransaction, Error> {
    let definition = get_recurring_transaction(id, connection)?;
    let new_state = !definition.is_active;

    let sql_transaction = connection.transaction()?;

    match &definition.transfer_group_id {
        Some(transfer_group_id) => {
            sql_transaction.execute(
                "UPDATE recurring_transaction SET is_active = ?1 WHERE transfer_group_id = ?2",
                params![new_state, transfer_group_id],
            )?;
        }
        None => {
            sql_transaction.execute(
                "UPDATE recurring_transaction SET is_active = ?1 WHERE id = ?2",
                params![new_state, id],
            )?;
        }
    }

    let definition = get_recurring_transaction(id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(definition)
}

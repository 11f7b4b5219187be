//! Defines the endpoint for listing recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, recurring::core::get_all_recurring_transactions};

/// The state needed to list recurring transactions.
#[derive(Debug, Clone)]
pub struct ListRecurringState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing recurring transactions, soonest due first.
pub async fn get_recurring_endpoint(State(state): State<ListRecurringState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_recurring_transactions(&connection) {
        Ok(definitions) => Json(definitions).into_response(),
        Err(error) => error.into_response(),
    }
}

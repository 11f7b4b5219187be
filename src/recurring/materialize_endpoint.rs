//! Defines the endpoint for running the scheduler on demand.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{AppState, Error, recurring::scheduler::materialize_due};

/// The state needed to run the scheduler.
#[derive(Debug, Clone)]
pub struct MaterializeState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MaterializeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that materializes everything due up to today and
/// responds with what the run did.
pub async fn materialize_endpoint(State(state): State<MaterializeState>) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let today = OffsetDateTime::now_utc().date();

    match materialize_due(today, &mut connection) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(error) => {
            tracing::warn!("could not materialize recurring transactions: {error}");
            error.into_response()
        }
    }
}

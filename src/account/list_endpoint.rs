//! Defines the endpoint for listing accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, account::core::get_all_accounts};

/// The state needed to list accounts.
#[derive(Debug, Clone)]
pub struct ListAccountsState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing all accounts.
pub async fn get_accounts_endpoint(State(state): State<ListAccountsState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_accounts(&connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        account::{
            core::{AccountType, get_all_accounts},
            create_endpoint::{AccountForm, create_account},
        },
        db::initialize,
    };

    #[test]
    fn lists_accounts_ordered_by_name() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        for name in ["Wallet", "Everyday", "Savings"] {
            create_account(
                &AccountForm {
                    name: name.to_owned(),
                    account_type: AccountType::Other,
                    balance: 0.0,
                    color: None,
                },
                &connection,
            )
            .unwrap();
        }

        let accounts = get_all_accounts(&connection).unwrap();

        let names: Vec<_> = accounts.iter().map(|account| account.name.as_str()).collect();
        assert_eq!(names, ["Everyday", "Savings", "Wallet"]);
    }
}

//! Defines the endpoint for adding a transaction to the ledger.
//!
//! The record insert, the balance update, and the sync hand-off are one SQL
//! transaction: either the ledger and the balance move together or neither
//! does.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::{
    AppState, Error,
    account::{Account, AccountId, apply_balance_delta, get_account},
    sync::enqueue_sync_event,
    transaction::core::{NewTransaction, Transaction, TransactionType, insert_transaction},
};

/// The state needed to add a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for adding a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// Whether this is income or an expense. Transfer legs are rejected
    /// here; they are created by the transfer operation.
    pub transaction_type: TransactionType,
    /// The positive amount of money moved.
    pub amount: f64,
    /// The category the transaction is tagged with.
    pub category: String,
    /// A user-facing description.
    pub description: String,
    /// The date the transaction happened. Defaults to today.
    #[serde(default)]
    pub date: Option<Date>,
    /// The wall-clock time the transaction happened. Defaults to now.
    #[serde(default)]
    pub time: Option<Time>,
}

/// The created transaction together with the owning account re-read after
/// the balance update.
#[derive(Debug, PartialEq, Serialize)]
pub struct TransactionReceipt {
    /// The newly created ledger entry.
    pub transaction: Transaction,
    /// The owning account with its updated balance.
    pub account: Account,
}

/// A route handler for adding a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(form): Json<TransactionForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match add_transaction(&form, &mut connection) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => {
            tracing::warn!("could not add transaction with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Validate `form`, persist the transaction, and apply its delta to the
/// owning account's balance.
///
/// # Errors
/// Returns a validation error before any mutation if a required field is
/// missing or the amount is not a positive finite number, and
/// [Error::NotFound] (rolling back the insert) if the account does not
/// exist.
pub fn add_transaction(
    form: &TransactionForm,
    connection: &mut Connection,
) -> Result<TransactionReceipt, Error> {
    validate_transaction_form(form)?;

    let now = OffsetDateTime::now_utc();
    let new_transaction = NewTransaction {
        account_id: form.account_id,
        transaction_type: form.transaction_type,
        amount: form.amount,
        category: form.category.clone(),
        description: form.description.clone(),
        date: form.date.unwrap_or(now.date()),
        time: form.time.unwrap_or(now.time()),
        transfer_group_id: None,
    };

    let sql_transaction = connection.transaction()?;

    let transaction = insert_transaction(&new_transaction, &sql_transaction)?;
    apply_balance_delta(
        transaction.account_id,
        transaction.signed_delta(),
        &sql_transaction,
    )?;
    enqueue_sync_event("transaction.created", &transaction, &sql_transaction)?;
    let account = get_account(transaction.account_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(TransactionReceipt {
        transaction,
        account,
    })
}

fn validate_transaction_form(form: &TransactionForm) -> Result<(), Error> {
    if form.transaction_type == TransactionType::Transfer {
        return Err(Error::DirectTransferCreation);
    }

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    if form.category.trim().is_empty() {
        return Err(Error::MissingField("category"));
    }

    if form.description.trim().is_empty() {
        return Err(Error::MissingField("description"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Time, macros::date};

    use crate::{
        Error,
        account::{AccountForm, AccountType, create_account, get_account},
        db::initialize,
        transaction::core::{TransactionType, get_all_transactions},
    };

    use super::{TransactionForm, add_transaction};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_account(balance: f64, connection: &Connection) -> i64 {
        create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                balance,
                color: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn transaction_form(account_id: i64, transaction_type: TransactionType) -> TransactionForm {
        TransactionForm {
            account_id,
            transaction_type,
            amount: 50.0,
            category: "Groceries".to_owned(),
            description: "Weekly shop".to_owned(),
            date: Some(date!(2024 - 03 - 09)),
            time: Some(Time::MIDNIGHT),
        }
    }

    #[test]
    fn income_increases_balance() {
        let mut connection = get_test_connection();
        let account_id = create_test_account(100.0, &connection);

        let receipt = add_transaction(
            &transaction_form(account_id, TransactionType::Income),
            &mut connection,
        )
        .unwrap();

        assert_eq!(receipt.account.balance, 150.0);
        assert_eq!(receipt.transaction.amount, 50.0);
    }

    #[test]
    fn expense_decreases_balance() {
        let mut connection = get_test_connection();
        let account_id = create_test_account(100.0, &connection);

        let receipt = add_transaction(
            &transaction_form(account_id, TransactionType::Expense),
            &mut connection,
        )
        .unwrap();

        assert_eq!(receipt.account.balance, 50.0);
    }

    #[test]
    fn transfer_type_is_rejected() {
        let mut connection = get_test_connection();
        let account_id = create_test_account(100.0, &connection);

        let result = add_transaction(
            &transaction_form(account_id, TransactionType::Transfer),
            &mut connection,
        );

        assert_eq!(result, Err(Error::DirectTransferCreation));
    }

    #[test]
    fn non_positive_amount_is_rejected_before_any_write() {
        let mut connection = get_test_connection();
        let account_id = create_test_account(100.0, &connection);
        let mut form = transaction_form(account_id, TransactionType::Income);
        form.amount = 0.0;

        let result = add_transaction(&form, &mut connection);

        assert_eq!(result, Err(Error::InvalidAmount(0.0)));
        assert!(get_all_transactions(&connection).unwrap().is_empty());
        assert_eq!(get_account(account_id, &connection).unwrap().balance, 100.0);
    }

    #[test]
    fn empty_category_is_rejected() {
        let mut connection = get_test_connection();
        let account_id = create_test_account(100.0, &connection);
        let mut form = transaction_form(account_id, TransactionType::Income);
        form.category = String::new();

        let result = add_transaction(&form, &mut connection);

        assert_eq!(result, Err(Error::MissingField("category")));
    }

    #[test]
    fn missing_account_rolls_back_the_insert() {
        let mut connection = get_test_connection();

        let result = add_transaction(
            &transaction_form(1337, TransactionType::Income),
            &mut connection,
        );

        assert_eq!(result, Err(Error::NotFound));
        assert!(get_all_transactions(&connection).unwrap().is_empty());
    }
}

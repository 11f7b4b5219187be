//! Defines the endpoint for creating a recurring transfer.
//!
//! A recurring transfer is stored as two definitions, one per account,
//! correlated by a shared group id. The scheduler materializes each
//! definition independently, producing an outgoing and an incoming leg for
//! every due date.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{
    AppState, Error,
    account::{AccountId, get_account},
    recurring::core::{
        Frequency, NewRecurringTransaction, RecurringTransaction, insert_recurring_transaction,
    },
    transaction::{TRANSFER_IN_CATEGORY, TRANSFER_OUT_CATEGORY, TransactionType},
};

/// The state needed to create a recurring transfer.
#[derive(Debug, Clone)]
pub struct CreateRecurringTransferState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRecurringTransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a recurring transfer.
#[derive(Debug, Deserialize)]
pub struct RecurringTransferForm {
    /// The account the funds leave on each occurrence.
    pub from_account_id: AccountId,
    /// The account the funds arrive in on each occurrence.
    pub to_account_id: AccountId,
    /// The positive amount moved on each occurrence.
    pub amount: f64,
    /// The description stamped on both legs of each occurrence.
    pub description: String,
    /// How often the transfer repeats.
    pub frequency: Frequency,
    /// The first occurrence date.
    pub start_date: Date,
    /// The last date an occurrence may fall on. Omit to recur indefinitely.
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// The two definitions of a created recurring transfer.
#[derive(Debug, PartialEq, Serialize)]
pub struct RecurringTransferReceipt {
    /// The identifier shared by both definitions.
    pub transfer_group_id: String,
    /// The definition that debits the source account.
    pub outgoing: RecurringTransaction,
    /// The definition that credits the destination account.
    pub incoming: RecurringTransaction,
}

/// A route handler for creating a recurring transfer.
pub async fn create_recurring_transfer_endpoint(
    State(state): State<CreateRecurringTransferState>,
    Json(form): Json<RecurringTransferForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_recurring_transfer(&form, &mut connection) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => {
            tracing::warn!("could not create recurring transfer with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Create both definitions of a recurring transfer in one SQL transaction.
///
/// # Errors
/// Returns, without writing anything:
/// - [Error::SameAccountTransfer] if both ids name the same account,
/// - [Error::InvalidAmount] if the amount is not a positive finite number,
/// - [Error::MissingField] if the description is empty,
/// - [Error::InvalidEndDate] if the end date is not after the start date,
/// - [Error::NotFound] if either account does not exist.
pub fn create_recurring_transfer(
    form: &RecurringTransferForm,
    connection: &mut Connection,
) -> Result<RecurringTransferReceipt, Error> {
    if form.from_account_id == form.to_account_id {
        return Err(Error::SameAccountTransfer);
    }

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    if form.description.trim().is_empty() {
        return Err(Error::MissingField("description"));
    }

    if let Some(end_date) = form.end_date
        && end_date <= form.start_date
    {
        return Err(Error::InvalidEndDate {
            start_date: form.start_date,
            end_date,
        });
    }

    let sql_transaction = connection.transaction()?;

    get_account(form.from_account_id, &sql_transaction)?;
    get_account(form.to_account_id, &sql_transaction)?;

    let transfer_group_id = Uuid::new_v4().to_string();

    let outgoing = insert_recurring_transaction(
        &new_transfer_definition(form, TRANSFER_OUT_CATEGORY, &transfer_group_id),
        &sql_transaction,
    )?;
    let incoming = insert_recurring_transaction(
        &new_transfer_definition(form, TRANSFER_IN_CATEGORY, &transfer_group_id),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(RecurringTransferReceipt {
        transfer_group_id,
        outgoing,
        incoming,
    })
}

fn new_transfer_definition(
    form: &RecurringTransferForm,
    category: &str,
    transfer_group_id: &str,
) -> NewRecurringTransaction {
    let account_id = if category == TRANSFER_OUT_CATEGORY {
        form.from_account_id
    } else {
        form.to_account_id
    };

    NewRecurringTransaction {
        account_id,
        transaction_type: TransactionType::Transfer,
        amount: form.amount,
        category: category.to_owned(),
        description: form.description.clone(),
        frequency: form.frequency,
        start_date: form.start_date,
        end_date: form.end_date,
        transfer_group_id: Some(transfer_group_id.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountType, create_account, get_account},
        db::initialize,
        recurring::{core::Frequency, scheduler::materialize_due},
        transaction::{TRANSFER_IN_CATEGORY, TRANSFER_OUT_CATEGORY, get_all_transactions},
    };

    use super::{RecurringTransferForm, create_recurring_transfer};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_account(name: &str, balance: f64, connection: &Connection) -> i64 {
        create_account(
            &AccountForm {
                name: name.to_owned(),
                account_type: AccountType::Checking,
                balance,
                color: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn weekly_form(from: i64, to: i64) -> RecurringTransferForm {
        RecurringTransferForm {
            from_account_id: from,
            to_account_id: to,
            amount: 25.0,
            description: "Savings sweep".to_owned(),
            frequency: Frequency::Weekly,
            start_date: date!(2024 - 03 - 01),
            end_date: None,
        }
    }

    #[test]
    fn creates_two_definitions_sharing_a_group_id() {
        let mut connection = get_test_connection();
        let from = create_test_account("Everyday", 500.0, &connection);
        let to = create_test_account("Savings", 0.0, &connection);

        let receipt =
            create_recurring_transfer(&weekly_form(from, to), &mut connection).unwrap();

        assert_eq!(receipt.outgoing.account_id, from);
        assert_eq!(receipt.incoming.account_id, to);
        assert_eq!(receipt.outgoing.category, TRANSFER_OUT_CATEGORY);
        assert_eq!(receipt.incoming.category, TRANSFER_IN_CATEGORY);
        assert_eq!(
            receipt.outgoing.transfer_group_id.as_deref(),
            Some(receipt.transfer_group_id.as_str())
        );
        assert_eq!(
            receipt.outgoing.transfer_group_id,
            receipt.incoming.transfer_group_id
        );
    }

    #[test]
    fn materialized_occurrences_move_funds_between_the_accounts() {
        let mut connection = get_test_connection();
        let from = create_test_account("Everyday", 500.0, &connection);
        let to = create_test_account("Savings", 0.0, &connection);
        create_recurring_transfer(&weekly_form(from, to), &mut connection).unwrap();

        // Occurrences on Mar 1 and Mar 8.
        materialize_due(date!(2024 - 03 - 10), &mut connection).unwrap();

        assert_eq!(get_account(from, &connection).unwrap().balance, 450.0);
        assert_eq!(get_account(to, &connection).unwrap().balance, 50.0);
        assert_eq!(get_all_transactions(&connection).unwrap().len(), 4);
    }

    #[test]
    fn same_account_is_rejected() {
        let mut connection = get_test_connection();
        let account = create_test_account("Everyday", 500.0, &connection);

        let result = create_recurring_transfer(&weekly_form(account, account), &mut connection);

        assert_eq!(result, Err(Error::SameAccountTransfer));
    }

    #[test]
    fn missing_account_writes_neither_definition() {
        let mut connection = get_test_connection();
        let from = create_test_account("Everyday", 500.0, &connection);

        let result = create_recurring_transfer(&weekly_form(from, 1337), &mut connection);

        assert_eq!(result, Err(Error::NotFound));
        assert!(
            crate::recurring::core::get_all_recurring_transactions(&connection)
                .unwrap()
                .is_empty()
        );
    }
}

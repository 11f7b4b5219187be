//! Moves funds between two accounts as a paired double-entry transaction.
//!
//! Both balance updates and both ledger entries are written inside a single
//! SQL transaction, with the insufficient-funds check inside that same
//! transaction. A transfer therefore either fully happens or leaves no
//! trace; there is no partially-applied state to reconcile.

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
use uuid::Uuid;

use crate::{
    AppState, Error,
    account::{Account, AccountId, apply_balance_delta, get_account},
    sync::enqueue_sync_event,
    transaction::{
        NewTransaction, TRANSFER_IN_CATEGORY, TRANSFER_OUT_CATEGORY, Transaction, TransactionType,
        insert_transaction,
    },
};

/// The state needed to transfer funds.
#[derive(Debug, Clone)]
pub struct TransferState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for transferring funds between two accounts.
#[derive(Debug, Deserialize)]
pub struct TransferForm {
    /// The account the funds leave.
    pub from_account_id: AccountId,
    /// The account the funds arrive in.
    pub to_account_id: AccountId,
    /// The positive amount to move.
    pub amount: f64,
    /// A user-facing description recorded on both legs.
    pub description: String,
    /// The date of the transfer. Defaults to today.
    #[serde(default)]
    pub date: Option<Date>,
}

/// The two legs of a completed transfer and both accounts re-read after the
/// balance updates.
#[derive(Debug, PartialEq, Serialize)]
pub struct TransferReceipt {
    /// The identifier shared by both legs.
    pub transfer_group_id: String,
    /// The "Transfer Out" leg on the source account.
    pub outgoing: Transaction,
    /// The "Transfer In" leg on the destination account.
    pub incoming: Transaction,
    /// The source account with its updated balance.
    pub from_account: Account,
    /// The destination account with its updated balance.
    pub to_account: Account,
}

/// A route handler for transferring funds between two accounts.
pub async fn create_transfer_endpoint(
    State(state): State<TransferState>,
    Json(form): Json<TransferForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match transfer_funds(&form, &mut connection) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => {
            tracing::warn!("could not transfer funds with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Move `form.amount` from the source account to the destination account.
///
/// # Errors
/// Returns, without writing anything:
/// - [Error::SameAccountTransfer] if both ids name the same account,
/// - [Error::InvalidAmount] if the amount is not a positive finite number,
/// - [Error::MissingField] if the description is empty,
/// - [Error::NotFound] if either account does not exist,
/// - [Error::InsufficientFunds] if the source balance is below the amount.
pub fn transfer_funds(
    form: &TransferForm,
    connection: &mut Connection,
) -> Result<TransferReceipt, Error> {
    if form.from_account_id == form.to_account_id {
        return Err(Error::SameAccountTransfer);
    }

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    if form.description.trim().is_empty() {
        return Err(Error::MissingField("description"));
    }

    let now = OffsetDateTime::now_utc();
    let date = form.date.unwrap_or(now.date());
    // Both legs are stamped with the same instant.
    let time = now.time();

    let sql_transaction = connection.transaction()?;

    let from_account = get_account(form.from_account_id, &sql_transaction)?;
    get_account(form.to_account_id, &sql_transaction)?;

    if from_account.balance < form.amount {
        return Err(Error::InsufficientFunds {
            available: from_account.balance,
            requested: form.amount,
        });
    }

    let transfer_group_id = Uuid::new_v4().to_string();

    let outgoing = insert_transaction(
        &new_transfer_leg(form, TRANSFER_OUT_CATEGORY, date, time, &transfer_group_id),
        &sql_transaction,
    )?;
    let incoming = insert_transaction(
        &new_transfer_leg(form, TRANSFER_IN_CATEGORY, date, time, &transfer_group_id),
        &sql_transaction,
    )?;

    apply_balance_delta(form.from_account_id, -form.amount, &sql_transaction)?;
    apply_balance_delta(form.to_account_id, form.amount, &sql_transaction)?;

    enqueue_sync_event("transaction.created", &outgoing, &sql_transaction)?;
    enqueue_sync_event("transaction.created", &incoming, &sql_transaction)?;

    let from_account = get_account(form.from_account_id, &sql_transaction)?;
    let to_account = get_account(form.to_account_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(TransferReceipt {
        transfer_group_id,
        outgoing,
        incoming,
        from_account,
        to_account,
    })
}

fn new_transfer_leg(
    form: &TransferForm,
    category: &str,
    date: Date,
    time: Time,
    transfer_group_id: &str,
) -> NewTransaction {
    let account_id = if category == TRANSFER_OUT_CATEGORY {
        form.from_account_id
    } else {
        form.to_account_id
    };

    NewTransaction {
        account_id,
        transaction_type: TransactionType::Transfer,
        amount: form.amount,
        category: category.to_owned(),
        description: form.description.clone(),
        date,
        time,
        transfer_group_id: Some(transfer_group_id.to_owned()),
    }
}

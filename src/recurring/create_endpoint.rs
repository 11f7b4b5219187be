//! Defines the endpoint for creating a recurring income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, get_account},
    recurring::core::{
        Frequency, NewRecurringTransaction, RecurringTransaction, insert_recurring_transaction,
    },
    transaction::TransactionType,
};

/// The state needed to create a recurring transaction.
#[derive(Debug, Clone)]
pub struct CreateRecurringState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a recurring income or expense.
#[derive(Debug, Deserialize)]
pub struct RecurringForm {
    /// The account materialized transactions belong to.
    pub account_id: AccountId,
    /// Whether occurrences are income or expenses.
    pub transaction_type: TransactionType,
    /// The positive amount of each occurrence.
    pub amount: f64,
    /// The category stamped on each occurrence.
    pub category: String,
    /// The description stamped on each occurrence.
    pub description: String,
    /// How often the transaction repeats.
    pub frequency: Frequency,
    /// The first occurrence date.
    pub start_date: Date,
    /// The last date an occurrence may fall on. Omit to recur indefinitely.
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// A route handler for creating a recurring transaction.
pub async fn create_recurring_endpoint(
    State(state): State<CreateRecurringState>,
    Json(form): Json<RecurringForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_recurring_transaction(&form, &connection) {
        Ok(definition) => (StatusCode::CREATED, Json(definition)).into_response(),
        Err(error) => {
            tracing::warn!("could not create recurring transaction with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Create a recurring income or expense definition. The first occurrence is
/// due on `form.start_date` and will be created the next time the scheduler
/// runs on or after that date.
///
/// # Errors
/// Returns:
/// - [Error::DirectTransferCreation] for transfer-type definitions, which
///   are only created in pairs by the recurring transfer operation,
/// - [Error::InvalidAmount] if the amount is not a positive finite number,
/// - [Error::MissingField] if the category or description is empty,
/// - [Error::InvalidEndDate] if the end date is not after the start date,
/// - [Error::NotFound] if the account does not exist.
pub fn create_recurring_transaction(
    form: &RecurringForm,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
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

    if let Some(end_date) = form.end_date
        && end_date <= form.start_date
    {
        return Err(Error::InvalidEndDate {
            start_date: form.start_date,
            end_date,
        });
    }

    get_account(form.account_id, connection)?;

    insert_recurring_transaction(
        &NewRecurringTransaction {
            account_id: form.account_id,
            transaction_type: form.transaction_type,
            amount: form.amount,
            category: form.category.clone(),
            description: form.description.clone(),
            frequency: form.frequency,
            start_date: form.start_date,
            end_date: form.end_date,
            transfer_group_id: None,
        },
        connection,
    )
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountType, create_account},
        db::initialize,
        recurring::core::Frequency,
        transaction::TransactionType,
    };

    use super::{RecurringForm, create_recurring_transaction};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_account(connection: &Connection) -> i64 {
        create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                balance: 0.0,
                color: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn rent_form(account_id: i64) -> RecurringForm {
        RecurringForm {
            account_id,
            transaction_type: TransactionType::Expense,
            amount: 100.0,
            category: "Rent".to_owned(),
            description: "Monthly rent".to_owned(),
            frequency: Frequency::Monthly,
            start_date: date!(2024 - 01 - 15),
            end_date: None,
        }
    }

    #[test]
    fn new_definition_is_due_on_its_start_date() {
        let connection = get_test_connection();
        let account_id = create_test_account(&connection);

        let definition =
            create_recurring_transaction(&rent_form(account_id), &connection).unwrap();

        assert_eq!(definition.next_occurrence, date!(2024 - 01 - 15));
        assert_eq!(definition.last_processed, None);
        assert!(definition.is_active);
        assert_eq!(definition.transfer_group_id, None);
    }

    #[test]
    fn transfer_type_is_rejected() {
        let connection = get_test_connection();
        let account_id = create_test_account(&connection);
        let form = RecurringForm {
            transaction_type: TransactionType::Transfer,
            ..rent_form(account_id)
        };

        let result = create_recurring_transaction(&form, &connection);

        assert_eq!(result, Err(Error::DirectTransferCreation));
    }

    #[test]
    fn end_date_must_be_after_start_date() {
        let connection = get_test_connection();
        let account_id = create_test_account(&connection);
        let form = RecurringForm {
            end_date: Some(date!(2024 - 01 - 15)),
            ..rent_form(account_id)
        };

        let result = create_recurring_transaction(&form, &connection);

        assert_eq!(
            result,
            Err(Error::InvalidEndDate {
                start_date: date!(2024 - 01 - 15),
                end_date: date!(2024 - 01 - 15),
            })
        );
    }

    #[test]
    fn missing_account_is_rejected() {
        let connection = get_test_connection();

        let result = create_recurring_transaction(&rent_form(1337), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let connection = get_test_connection();
        let account_id = create_test_account(&connection);
        let form = RecurringForm {
            amount: -5.0,
            ..rent_form(account_id)
        };

        let result = create_recurring_transaction(&form, &connection);

        assert_eq!(result, Err(Error::InvalidAmount(-5.0)));
    }
}

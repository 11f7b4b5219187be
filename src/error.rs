//! Defines the app level error type and its conversion to JSON HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::Date;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or empty.
    #[error("the field \"{0}\" is required and cannot be empty")]
    MissingField(&'static str),

    /// An amount was zero, negative, or not a finite number.
    ///
    /// Amounts are always stored positive; the sign applied to an account
    /// balance is derived from the transaction type.
    #[error("{0} is not a valid amount, amounts must be finite and greater than zero")]
    InvalidAmount(f64),

    /// A transfer named the same account as both source and destination.
    #[error("cannot transfer funds from an account to itself")]
    SameAccountTransfer,

    /// A transfer amount exceeded the source account's balance.
    ///
    /// The check runs inside the same SQL transaction as the balance
    /// updates, so no writes have happened when this error is returned.
    #[error("insufficient funds: the account holds {available} but {requested} was requested")]
    InsufficientFunds {
        /// The source account's balance at the time of the check.
        available: f64,
        /// The amount the transfer asked for.
        requested: f64,
    },

    /// A recurring definition's end date was on or before its start date.
    #[error("the end date {end_date} is not after the start date {start_date}")]
    InvalidEndDate {
        /// The first occurrence date of the definition.
        start_date: Date,
        /// The rejected end date.
        end_date: Date,
    },

    /// A transfer-type transaction was submitted to the add-transaction
    /// operation.
    ///
    /// Transfer legs are only created in pairs by the transfer operation
    /// (or by the scheduler for recurring transfers), so the two legs can
    /// never exist independently.
    #[error("transfer transactions must be created through the transfer operation")]
    DirectTransferCreation,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete an account that does not exist.
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist.
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that transactions still reference.
    ///
    /// The balance invariant (balance equals the sum of applied deltas)
    /// would be unrecoverable if the history behind it disappeared.
    #[error("account {0} still has transactions and cannot be deleted")]
    AccountInUse(i64),

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to clients when an operation fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::MissingField(_)
            | Error::InvalidAmount(_)
            | Error::SameAccountTransfer
            | Error::InvalidEndDate { .. }
            | Error::DirectTransferCreation
            | Error::DuplicateAccountName(_)
            | Error::DuplicateCategoryName(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::DeleteMissingTransaction
            | Error::DeleteMissingAccount
            | Error::UpdateMissingAccount => StatusCode::NOT_FOUND,
            Error::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::AccountInUse(_) => StatusCode::CONFLICT,
            Error::JsonSerializationError(_) | Error::DatabaseLockError | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Server-side failure detail is not intended to be shown to the client.
        if status_code.is_server_error() {
            tracing::error!("an unexpected error occurred: {self}");
            return (
                status_code,
                Json(ErrorBody {
                    error: "something went wrong, check the server logs for more details"
                        .to_owned(),
                }),
            )
                .into_response();
        }

        (
            status_code,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_funds_maps_to_422() {
        let response = Error::InsufficientFunds {
            available: 10.0,
            requested: 25.0,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn sql_error_detail_is_not_leaked() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn query_returned_no_rows_converts_to_not_found() {
        let error = Error::from(rusqlite::Error::QueryReturnedNoRows);

        assert_eq!(error, Error::NotFound);
    }
}

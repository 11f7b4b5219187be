//! The transaction model: the durable record every balance change is
//! derived from.

use std::str::FromStr;

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use time::{Date, Time};

use crate::{Error, account::AccountId};

/// Alias for the integer type used for transaction ids.
pub type TransactionId = i64;

/// The category recorded on the outgoing leg of a transfer.
pub const TRANSFER_OUT_CATEGORY: &str = "Transfer Out";

/// The category recorded on the incoming leg of a transfer.
pub const TRANSFER_IN_CATEGORY: &str = "Transfer In";

/// The error returned when a string is not a valid transaction type tag.
#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid transaction type")]
pub struct ParseTransactionTypeError(String);

/// Whether a transaction adds to, removes from, or moves money between
/// accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming into an account.
    Income,
    /// Money leaving an account.
    Expense,
    /// One leg of a paired double-entry transfer. The direction is carried
    /// by the category ([TRANSFER_OUT_CATEGORY] or [TRANSFER_IN_CATEGORY]).
    Transfer,
}

impl TransactionType {
    /// The tag stored in the database for this transaction type.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(ParseTransactionTypeError(other.to_owned())),
        }
    }
}

/// A single ledger entry.
///
/// The amount is always stored positive; [Transaction::signed_delta]
/// derives the sign that was applied to the owning account's balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The id for the transaction.
    pub id: TransactionId,
    /// The account this transaction belongs to.
    pub account_id: AccountId,
    /// Whether this is income, an expense, or a transfer leg.
    pub transaction_type: TransactionType,
    /// The positive amount of money moved.
    pub amount: f64,
    /// The category the transaction is tagged with.
    pub category: String,
    /// A user-facing description.
    pub description: String,
    /// The date the transaction happened.
    pub date: Date,
    /// The wall-clock time the transaction happened.
    pub time: Time,
    /// Correlates the two legs of a transfer. `None` for income/expense.
    pub transfer_group_id: Option<String>,
}

impl Transaction {
    /// The signed amount this transaction applied to its account's balance.
    pub fn signed_delta(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
            TransactionType::Transfer => {
                if self.category == TRANSFER_OUT_CATEGORY {
                    -self.amount
                } else {
                    self.amount
                }
            }
        }
    }
}

/// The fields needed to insert a transaction record.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// Whether this is income, an expense, or a transfer leg.
    pub transaction_type: TransactionType,
    /// The positive amount of money moved.
    pub amount: f64,
    /// The category the transaction is tagged with.
    pub category: String,
    /// A user-facing description.
    pub description: String,
    /// The date the transaction happened.
    pub date: Date,
    /// The wall-clock time the transaction happened.
    pub time: Time,
    /// Correlates the two legs of a transfer.
    pub transfer_group_id: Option<String>,
}

/// Create the transaction table if it does not exist.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id),
            transaction_type TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            transfer_group_id TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into a [Transaction].
pub fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_transaction_type: String = row.get(2)?;
    let transaction_type = raw_transaction_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        transaction_type,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        time: row.get(7)?,
        transfer_group_id: row.get(8)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, account_id, transaction_type, amount, category, description, date, time, transfer_group_id";

/// Insert a transaction record.
///
/// This only writes the record; callers are responsible for applying the
/// balance delta in the same SQL transaction.
pub fn insert_transaction(
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection.execute(
        "INSERT INTO \"transaction\"
            (account_id, transaction_type, amount, category, description, date, time, transfer_group_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new_transaction.account_id,
            new_transaction.transaction_type.as_str(),
            new_transaction.amount,
            new_transaction.category,
            new_transaction.description,
            new_transaction.date,
            new_transaction.time,
            new_transaction.transfer_group_id,
        ],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        account_id: new_transaction.account_id,
        transaction_type: new_transaction.transaction_type,
        amount: new_transaction.amount,
        category: new_transaction.category.clone(),
        description: new_transaction.description.clone(),
        date: new_transaction.date,
        time: new_transaction.time,
        transfer_group_id: new_transaction.transfer_group_id.clone(),
    })
}

/// Get a transaction by its id.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a transaction.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_one(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1"),
            params![id],
            map_row_to_transaction,
        )
        .map_err(Error::from)
}

/// Get all transactions, most recent first.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY date DESC, time DESC, id DESC"
        ))?
        .query_map([], map_row_to_transaction)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get all transactions belonging to the account `account_id`, most recent
/// first.
pub fn get_transactions_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                WHERE account_id = ?1 ORDER BY date DESC, time DESC, id DESC"
        ))?
        .query_map(params![account_id], map_row_to_transaction)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

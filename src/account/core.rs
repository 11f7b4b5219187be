//! The account model and the balance mutator.

use std::str::FromStr;

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Alias for the integer type used for account ids.
pub type AccountId = i64;

/// The error returned when a string is not a valid account type tag.
#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid account type")]
pub struct ParseAccountTypeError(String);

/// What kind of account a balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// An everyday bank account.
    Checking,
    /// A savings account.
    Savings,
    /// A credit card. Balances are usually negative.
    Credit,
    /// Physical cash.
    Cash,
    /// Anything else (loans, investment accounts, etc.).
    Other,
}

impl AccountType {
    /// The tag stored in the database for this account type.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Cash => "cash",
            AccountType::Other => "other",
        }
    }
}

impl FromStr for AccountType {
    type Err = ParseAccountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit" => Ok(AccountType::Credit),
            "cash" => Ok(AccountType::Cash),
            "other" => Ok(AccountType::Other),
            other => Err(ParseAccountTypeError(other.to_owned())),
        }
    }
}

/// An account and the money available in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user-facing name of the account.
    pub name: String,
    /// What kind of account this is.
    pub account_type: AccountType,
    /// The signed balance.
    ///
    /// Invariant: equals the sum of the signed transaction amounts applied
    /// to this account since creation. Maintained incrementally through
    /// [apply_balance_delta], never recomputed.
    pub balance: f64,
    /// A display color. Not interpreted by the server.
    pub color: Option<String>,
}

/// Create the account table if it does not exist.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            account_type TEXT NOT NULL,
            balance REAL NOT NULL,
            color TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into an [Account].
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_account_type: String = row.get(2)?;
    let account_type = raw_account_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        account_type,
        balance: row.get(3)?,
        color: row.get(4)?,
    })
}

/// Get an account by its id.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an account, or an
/// error if the query fails.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_one(
            "SELECT id, name, account_type, balance, color FROM account WHERE id = ?1",
            params![id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get all accounts ordered by name.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, account_type, balance, color FROM account ORDER BY name")?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Apply a signed delta to an account's balance and return the new balance.
///
/// The increment runs server side as a single `UPDATE`, so concurrent
/// mutations cannot lose updates the way a read-then-write would.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an account, or an
/// error if the update fails.
pub fn apply_balance_delta(
    id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_one(
            "UPDATE account SET balance = balance + ?1 WHERE id = ?2 RETURNING balance",
            params![delta, id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Whether any transaction still references the account `id`.
pub fn account_has_transactions(id: AccountId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_one(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE account_id = ?1)",
            params![id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}


#[cfg(test)]
mod apply_balance_delta_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{apply_balance_delta, get_account};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn insert_account(balance: f64, connection: &Connection) -> i64 {
        connection
            .execute(
                "INSERT INTO account (name, account_type, balance) VALUES ('Everyday', 'checking', ?1)",
                [balance],
            )
            .unwrap();
        connection.last_insert_rowid()
    }

    #[test]
    fn positive_delta_increases_balance() {
        let connection = get_test_connection();
        let id = insert_account(100.0, &connection);

        let balance = apply_balance_delta(id, 25.5, &connection).unwrap();

        assert_eq!(balance, 125.5);
        assert_eq!(get_account(id, &connection).unwrap().balance, 125.5);
    }

    #[test]
    fn negative_delta_decreases_balance() {
        let connection = get_test_connection();
        let id = insert_account(100.0, &connection);

        let balance = apply_balance_delta(id, -40.0, &connection).unwrap();

        assert_eq!(balance, 60.0);
    }

    #[test]
    fn zero_delta_leaves_balance_unchanged() {
        let connection = get_test_connection();
        let id = insert_account(12.34, &connection);

        let balance = apply_balance_delta(id, 0.0, &connection).unwrap();

        assert_eq!(balance, 12.34);
    }

    #[test]
    fn missing_account_returns_not_found() {
        let connection = get_test_connection();

        let result = apply_balance_delta(1337, 10.0, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }
}

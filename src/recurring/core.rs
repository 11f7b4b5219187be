//! The recurring transaction model: a definition that the scheduler turns
//! into concrete ledger entries as its due dates pass.

use std::str::FromStr;

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, util::days_in_month};

use crate::{Error, account::AccountId, transaction::TransactionType};

/// Alias for the integer type used for recurring transaction ids.
pub type RecurringTransactionId = i64;

/// The error returned when a string is not a valid frequency tag.
#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid frequency")]
pub struct ParseFrequencyError(String);

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, clamped to the last day of shorter months.
    Monthly,
    /// Every calendar year, clamped on Feb 29 anniversaries.
    Yearly,
}

impl Frequency {
    /// The tag stored in the database for this frequency.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The due date one period after `date`.
    ///
    /// Month and year steps clamp to the last day of the target month
    /// rather than rolling over, so a definition anchored on Jan 31 falls
    /// due on Feb 28 (or 29), not Mar 3.
    pub fn advance(self, date: Date) -> Date {
        match self {
            Frequency::Daily => date.saturating_add(Duration::days(1)),
            Frequency::Weekly => date.saturating_add(Duration::weeks(1)),
            Frequency::Monthly => add_calendar_months(date, 1),
            Frequency::Yearly => add_calendar_years(date, 1),
        }
    }
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(ParseFrequencyError(other.to_owned())),
        }
    }
}

fn add_calendar_months(date: Date, months: i32) -> Date {
    let mut year = date.year();
    let mut month = u8::from(date.month()) as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }

    // month is in 1..=12 here, so the conversion cannot fail.
    let month = Month::try_from(month as u8).unwrap_or(date.month());
    let day = date.day().min(days_in_month(month, year));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

fn add_calendar_years(date: Date, years: i32) -> Date {
    let year = date.year() + years;
    let day = date.day().min(days_in_month(date.month(), year));

    Date::from_calendar_date(year, date.month(), day).unwrap_or(date)
}

/// A transaction that repeats on a regular schedule (e.g., wages, rent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTransaction {
    /// The id for the definition.
    pub id: RecurringTransactionId,
    /// The account materialized transactions belong to.
    pub account_id: AccountId,
    /// Whether materialized transactions are income, expenses, or transfer
    /// legs.
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
    /// The last date an occurrence may fall on. `None` recurs indefinitely.
    pub end_date: Option<Date>,
    /// The next date an occurrence is due.
    ///
    /// Invariant: always on or after `start_date`.
    pub next_occurrence: Date,
    /// The date the scheduler last processed this definition.
    pub last_processed: Option<Date>,
    /// Whether the scheduler still considers this definition. Becomes
    /// `false` permanently once `next_occurrence` passes `end_date`.
    pub is_active: bool,
    /// Correlates the two definitions of a recurring transfer. `None` for
    /// income/expense definitions.
    pub transfer_group_id: Option<String>,
}

/// The fields needed to insert a recurring transaction definition.
#[derive(Debug, Clone)]
pub struct NewRecurringTransaction {
    /// The account materialized transactions belong to.
    pub account_id: AccountId,
    /// Whether materialized transactions are income, expenses, or transfer
    /// legs.
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
    /// The last date an occurrence may fall on.
    pub end_date: Option<Date>,
    /// Correlates the two definitions of a recurring transfer.
    pub transfer_group_id: Option<String>,
}

/// Create the recurring transaction table if it does not exist.
pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id),
            transaction_type TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            next_occurrence TEXT NOT NULL,
            last_processed TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            transfer_group_id TEXT
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_recurring_transaction(
    row: &Row,
) -> Result<RecurringTransaction, rusqlite::Error> {
    let raw_transaction_type: String = row.get(2)?;
    let transaction_type = raw_transaction_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    let raw_frequency: String = row.get(6)?;
    let frequency = raw_frequency
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?;

    Ok(RecurringTransaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        transaction_type,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        frequency,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        next_occurrence: row.get(9)?,
        last_processed: row.get(10)?,
        is_active: row.get(11)?,
        transfer_group_id: row.get(12)?,
    })
}

const RECURRING_COLUMNS: &str = "id, account_id, transaction_type, amount, category, description, \
    frequency, start_date, end_date, next_occurrence, last_processed, is_active, transfer_group_id";

/// Insert a recurring transaction definition.
///
/// The first occurrence is due at `start_date` and the definition starts
/// active.
pub fn insert_recurring_transaction(
    new_definition: &NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection.execute(
        "INSERT INTO recurring_transaction
            (account_id, transaction_type, amount, category, description, frequency,
             start_date, end_date, next_occurrence, is_active, transfer_group_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)",
        params![
            new_definition.account_id,
            new_definition.transaction_type.as_str(),
            new_definition.amount,
            new_definition.category,
            new_definition.description,
            new_definition.frequency.as_str(),
            new_definition.start_date,
            new_definition.end_date,
            new_definition.start_date,
            new_definition.transfer_group_id,
        ],
    )?;

    let id = connection.last_insert_rowid();

    Ok(RecurringTransaction {
        id,
        account_id: new_definition.account_id,
        transaction_type: new_definition.transaction_type,
        amount: new_definition.amount,
        category: new_definition.category.clone(),
        description: new_definition.description.clone(),
        frequency: new_definition.frequency,
        start_date: new_definition.start_date,
        end_date: new_definition.end_date,
        next_occurrence: new_definition.start_date,
        last_processed: None,
        is_active: true,
        transfer_group_id: new_definition.transfer_group_id.clone(),
    })
}

/// Get a recurring transaction definition by its id.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a definition.
pub fn get_recurring_transaction(
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .query_one(
            &format!("SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE id = ?1"),
            params![id],
            map_row_to_recurring_transaction,
        )
        .map_err(Error::from)
}

/// Get all recurring transaction definitions.
pub fn get_all_recurring_transactions(
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction ORDER BY next_occurrence, id"
        ))?
        .query_map([], map_row_to_recurring_transaction)?
        .map(|maybe_definition| maybe_definition.map_err(Error::from))
        .collect()
}

/// Get the active definitions due on or before `today`.
///
/// Deliberately no `end_date` filter: a definition whose end date passed
/// between sessions still has occurrences to materialize (and must end up
/// deactivated), so the scheduler has to see it.
pub fn get_due_recurring_transactions(
    today: Date,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
                WHERE is_active = 1 AND next_occurrence <= ?1 ORDER BY id"
        ))?
        .query_map(params![today], map_row_to_recurring_transaction)?
        .map(|maybe_definition| maybe_definition.map_err(Error::from))
        .collect()
}

/// Persist a definition's schedule state after a scheduler step.
pub fn update_schedule_state(
    definition: &RecurringTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE recurring_transaction
            SET next_occurrence = ?1, last_processed = ?2, is_active = ?3 WHERE id = ?4",
        params![
            definition.next_occurrence,
            definition.last_processed,
            definition.is_active,
            definition.id,
        ],
    )?;

    Ok(())
}


#[cfg(test)]
mod advance_tests {
    use time::macros::date;

    use super::Frequency;

    #[test]
    fn daily_adds_one_day() {
        assert_eq!(
            Frequency::Daily.advance(date!(2024 - 01 - 31)),
            date!(2024 - 02 - 01)
        );
    }

    #[test]
    fn weekly_adds_seven_days() {
        assert_eq!(
            Frequency::Weekly.advance(date!(2024 - 02 - 26)),
            date!(2024 - 03 - 04)
        );
    }

    #[test]
    fn monthly_keeps_the_day_of_month() {
        assert_eq!(
            Frequency::Monthly.advance(date!(2024 - 01 - 15)),
            date!(2024 - 02 - 15)
        );
    }

    #[test]
    fn monthly_clamps_to_the_end_of_shorter_months() {
        // Leap year: January 31 clamps to February 29, not March 2.
        assert_eq!(
            Frequency::Monthly.advance(date!(2024 - 01 - 31)),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Frequency::Monthly.advance(date!(2023 - 01 - 31)),
            date!(2023 - 02 - 28)
        );
        assert_eq!(
            Frequency::Monthly.advance(date!(2024 - 03 - 31)),
            date!(2024 - 04 - 30)
        );
    }

    #[test]
    fn monthly_wraps_the_year() {
        assert_eq!(
            Frequency::Monthly.advance(date!(2024 - 12 - 15)),
            date!(2025 - 01 - 15)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            Frequency::Yearly.advance(date!(2024 - 02 - 29)),
            date!(2025 - 02 - 28)
        );
        assert_eq!(
            Frequency::Yearly.advance(date!(2024 - 07 - 04)),
            date!(2025 - 07 - 04)
        );
    }
}

#[cfg(test)]
mod frequency_tag_tests {
    use super::Frequency;

    #[test]
    fn round_trips_through_str() {
        for frequency in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Yearly,
        ] {
            let parsed: Frequency = frequency.as_str().parse().unwrap();
            assert_eq!(parsed, frequency);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!("fortnightly".parse::<Frequency>().is_err());
    }
}

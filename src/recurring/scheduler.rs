//! Materializes due recurring transactions into concrete ledger entries.
//!
//! The scheduler runs at start-up and on demand. Each occurrence is written
//! in its own SQL transaction: the ledger entry, the balance update, the
//! sync event, and the advanced schedule state commit together, so a crash
//! mid-run can lose at most un-materialized occurrences, never produce a
//! transaction whose balance effect was not applied (or vice versa).

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Time};

use crate::{
    Error,
    account::apply_balance_delta,
    recurring::core::{
        RecurringTransaction, get_due_recurring_transactions, update_schedule_state,
    },
    sync::enqueue_sync_event,
    transaction::{NewTransaction, insert_transaction},
};

/// What a scheduler run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterializeOutcome {
    /// How many due definitions the run looked at.
    pub definitions_processed: usize,
    /// How many ledger transactions the run created.
    pub transactions_created: usize,
}

/// Materialize every occurrence of every active definition that is due on
/// or before `today`.
///
/// A definition that has not been processed for several periods catches up
/// in one run: each missed occurrence becomes its own transaction, dated on
/// the day it was originally due. Once a definition's next occurrence moves
/// past its end date it is deactivated and never looked at again.
///
/// Running twice on the same day is a no-op the second time.
pub fn materialize_due(
    today: Date,
    connection: &mut Connection,
) -> Result<MaterializeOutcome, Error> {
    let due = get_due_recurring_transactions(today, connection)?;
    let definitions_processed = due.len();
    let mut transactions_created = 0;

    for mut definition in due {
        transactions_created += materialize_definition(&mut definition, today, connection)?;
    }

    if transactions_created > 0 {
        tracing::info!(
            "materialized {transactions_created} transaction(s) from \
                {definitions_processed} recurring definition(s)"
        );
    }

    Ok(MaterializeOutcome {
        definitions_processed,
        transactions_created,
    })
}

fn materialize_definition(
    definition: &mut RecurringTransaction,
    today: Date,
    connection: &mut Connection,
) -> Result<usize, Error> {
    let mut created = 0;

    while definition.is_active && definition.next_occurrence <= today {
        let occurrence_date = definition.next_occurrence;

        let past_end = definition
            .end_date
            .is_some_and(|end_date| occurrence_date > end_date);

        let sql_transaction = connection.transaction()?;

        if !past_end {
            let transaction = insert_transaction(
                &NewTransaction {
                    account_id: definition.account_id,
                    transaction_type: definition.transaction_type,
                    amount: definition.amount,
                    category: definition.category.clone(),
                    description: definition.description.clone(),
                    date: occurrence_date,
                    time: Time::MIDNIGHT,
                    transfer_group_id: definition.transfer_group_id.clone(),
                },
                &sql_transaction,
            )?;
            apply_balance_delta(
                definition.account_id,
                transaction.signed_delta(),
                &sql_transaction,
            )?;
            enqueue_sync_event("transaction.created", &transaction, &sql_transaction)?;

            definition.next_occurrence = definition.frequency.advance(occurrence_date);
            definition.last_processed = Some(today);
            created += 1;
        }

        if definition
            .end_date
            .is_some_and(|end_date| definition.next_occurrence > end_date)
        {
            definition.is_active = false;
        }

        update_schedule_state(definition, &sql_transaction)?;

        sql_transaction.commit()?;
    }

    Ok(created)
}

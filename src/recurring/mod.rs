//! Recurring transactions: definitions that repeat on a schedule and the
//! scheduler that turns their due dates into real ledger entries.

mod core;
mod create_endpoint;
mod create_transfer_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod materialize_endpoint;
mod scheduler;
mod toggle_endpoint;

pub use core::{
    Frequency, NewRecurringTransaction, RecurringTransaction, RecurringTransactionId,
    create_recurring_transaction_table, get_all_recurring_transactions,
    get_due_recurring_transactions, get_recurring_transaction, insert_recurring_transaction,
};
pub use create_endpoint::{RecurringForm, create_recurring_endpoint, create_recurring_transaction};
pub use create_transfer_endpoint::{
    RecurringTransferForm, RecurringTransferReceipt, create_recurring_transfer,
    create_recurring_transfer_endpoint,
};
pub use delete_endpoint::{delete_recurring_endpoint, delete_recurring_transaction};
pub use list_endpoint::get_recurring_endpoint;
pub use materialize_endpoint::materialize_endpoint;
pub use scheduler::{MaterializeOutcome, materialize_due};
pub use toggle_endpoint::{toggle_recurring_endpoint, toggle_recurring_transaction};

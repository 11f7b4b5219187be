mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    NewTransaction, TRANSFER_IN_CATEGORY, TRANSFER_OUT_CATEGORY, Transaction, TransactionId,
    TransactionType, create_transaction_table, get_all_transactions, get_transaction,
    get_transactions_for_account, insert_transaction, map_row_to_transaction,
};
pub use create_endpoint::{
    TransactionForm, TransactionReceipt, add_transaction, create_transaction_endpoint,
};
pub use delete_endpoint::{delete_transaction, delete_transaction_endpoint};
pub use list_endpoint::{TransactionListQuery, get_transactions_endpoint};

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Account, AccountId, AccountType, account_has_transactions, apply_balance_delta,
    create_account_table, get_account, get_all_accounts, map_row_to_account,
};
pub use create_endpoint::{AccountForm, create_account, create_account_endpoint};
pub use delete_endpoint::{delete_account, delete_account_endpoint};
pub use edit_endpoint::{UpdateAccountForm, edit_account_endpoint, update_account};
pub use list_endpoint::get_accounts_endpoint;

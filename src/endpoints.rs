//! The API endpoint URIs.

/// The route to list accounts and create an account.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to update or delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to list transactions and record a new one.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to transfer funds between two accounts.
pub const TRANSFERS: &str = "/api/transfers";
/// The route to list recurring transactions and create one.
pub const RECURRING: &str = "/api/recurring";
/// The route to create a recurring transfer.
pub const RECURRING_TRANSFERS: &str = "/api/recurring/transfers";
/// The route to delete a single recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{recurring_id}";
/// The route to pause or resume a recurring transaction.
pub const RECURRING_TOGGLE: &str = "/api/recurring/{recurring_id}/toggle";
/// The route to materialize everything due up to today.
pub const RECURRING_MATERIALIZE: &str = "/api/recurring/materialize";
/// The route to list categories and create one.
pub const CATEGORIES: &str = "/api/categories";
/// The route to delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_endpoint,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint},
    endpoints,
    logging::logging_middleware,
    recurring::{
        create_recurring_endpoint, create_recurring_transfer_endpoint, delete_recurring_endpoint,
        get_recurring_endpoint, materialize_endpoint, toggle_recurring_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
    },
    transfer::create_transfer_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            put(edit_account_endpoint).delete(delete_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(endpoints::TRANSFERS, post(create_transfer_endpoint))
        .route(
            endpoints::RECURRING,
            get(get_recurring_endpoint).post(create_recurring_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSFERS,
            post(create_recurring_transfer_endpoint),
        )
        .route(
            endpoints::RECURRING_MATERIALIZE,
            post(materialize_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION,
            delete(delete_recurring_endpoint),
        )
        .route(endpoints::RECURRING_TOGGLE, post(toggle_recurring_endpoint))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

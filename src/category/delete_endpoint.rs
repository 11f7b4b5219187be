//! Defines the endpoint for deleting a category.
//!
//! Deleting a category never cascades: transactions keep the category name
//! they were recorded with.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, params};

use crate::{AppState, Error, category::core::CategoryId};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a category.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            tracing::warn!("could not delete category {category_id}: {error}");
            error.into_response()
        }
    }
}

/// Delete the category `id`. Existing transactions are untouched.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a category.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", params![id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Time, macros::date};

    use crate::{
        Error,
        account::{AccountForm, AccountType, create_account},
        category::{
            core::{CategoryType, get_all_categories},
            create_endpoint::{CategoryForm, create_category},
        },
        db::initialize,
        transaction::{NewTransaction, TransactionType, get_transaction, insert_transaction},
    };

    use super::delete_category;

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn delete_category_removes_it() {
        let connection = get_test_connection();
        let category = create_category(
            &CategoryForm {
                name: "Hobbies".to_owned(),
                category_type: CategoryType::Expense,
            },
            &connection,
        )
        .unwrap();

        delete_category(category.id, &connection).unwrap();

        assert!(
            get_all_categories(&connection)
                .unwrap()
                .iter()
                .all(|remaining| remaining.id != category.id)
        );
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();

        let result = delete_category(1337, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn transactions_keep_the_name_of_a_deleted_category() {
        let connection = get_test_connection();
        let account_id = create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                account_type: AccountType::Checking,
                balance: 0.0,
                color: None,
            },
            &connection,
        )
        .unwrap()
        .id;
        let category = create_category(
            &CategoryForm {
                name: "Hobbies".to_owned(),
                category_type: CategoryType::Expense,
            },
            &connection,
        )
        .unwrap();
        let transaction = insert_transaction(
            &NewTransaction {
                account_id,
                transaction_type: TransactionType::Expense,
                amount: 30.0,
                category: category.name.clone(),
                description: "Model paint".to_owned(),
                date: date!(2024 - 03 - 01),
                time: Time::MIDNIGHT,
                transfer_group_id: None,
            },
            &connection,
        )
        .unwrap();

        delete_category(category.id, &connection).unwrap();

        let transaction = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(transaction.category, "Hobbies");
    }
}

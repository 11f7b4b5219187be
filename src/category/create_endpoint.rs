//! Defines the endpoint for creating a category.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::core::{Category, CategoryType},
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The category's unique name.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub category_type: CategoryType,
}

/// A route handler for creating a category.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Json(form): Json<CategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(&form, &connection) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => {
            tracing::warn!("could not create category with {form:?}: {error}");
            error.into_response()
        }
    }
}

/// Create a user-defined category.
///
/// # Errors
/// Returns:
/// - [Error::MissingField] if the name is empty,
/// - [Error::DuplicateCategoryName] if the name is already taken.
pub fn create_category(form: &CategoryForm, connection: &Connection) -> Result<Category, Error> {
    if form.name.trim().is_empty() {
        return Err(Error::MissingField("name"));
    }

    connection
        .execute(
            "INSERT INTO category (name, category_type, is_default) VALUES (?1, ?2, 0)",
            rusqlite::params![form.name, form.category_type.as_str()],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateCategoryName(form.name.clone())
            }
            error => error.into(),
        })?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: form.name.clone(),
        category_type: form.category_type,
        is_default: false,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, category::core::CategoryType, db::initialize};

    use super::{CategoryForm, create_category};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_connection();

        let category = create_category(
            &CategoryForm {
                name: "Hobbies".to_owned(),
                category_type: CategoryType::Expense,
            },
            &connection,
        )
        .unwrap();

        assert_eq!(category.name, "Hobbies");
        assert_eq!(category.category_type, CategoryType::Expense);
        assert!(!category.is_default);
    }

    #[test]
    fn duplicate_name_fails() {
        let connection = get_test_connection();
        let form = CategoryForm {
            name: "Hobbies".to_owned(),
            category_type: CategoryType::Expense,
        };
        create_category(&form, &connection).unwrap();

        let result = create_category(&form, &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName("Hobbies".to_owned())));
    }

    #[test]
    fn name_clashing_with_a_default_fails() {
        let connection = get_test_connection();

        let result = create_category(
            &CategoryForm {
                name: "Groceries".to_owned(),
                category_type: CategoryType::Expense,
            },
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn empty_name_fails() {
        let connection = get_test_connection();

        let result = create_category(
            &CategoryForm {
                name: "   ".to_owned(),
                category_type: CategoryType::Income,
            },
            &connection,
        );

        assert_eq!(result, Err(Error::MissingField("name")));
    }
}

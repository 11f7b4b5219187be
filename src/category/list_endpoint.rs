//! Defines the endpoint for listing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, category::core::get_all_categories};

/// The state needed to list categories.
#[derive(Debug, Clone)]
pub struct ListCategoriesState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListCategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing categories, ordered by name.
pub async fn get_categories_endpoint(State(state): State<ListCategoriesState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        category::{
            core::{CategoryType, get_all_categories},
            create_endpoint::{CategoryForm, create_category},
        },
        db::initialize,
    };

    #[test]
    fn categories_are_ordered_by_name() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_category(
            &CategoryForm {
                name: "Zoo Trips".to_owned(),
                category_type: CategoryType::Expense,
            },
            &connection,
        )
        .unwrap();
        create_category(
            &CategoryForm {
                name: "Allowance".to_owned(),
                category_type: CategoryType::Income,
            },
            &connection,
        )
        .unwrap();

        let categories = get_all_categories(&connection).unwrap();

        let mut sorted: Vec<_> = categories.iter().map(|category| &category.name).collect();
        sorted.sort();
        let names: Vec<_> = categories.iter().map(|category| &category.name).collect();
        assert_eq!(names, sorted);
        assert_eq!(names.first().map(|name| name.as_str()), Some("Allowance"));
        assert_eq!(names.last().map(|name| name.as_str()), Some("Zoo Trips"));
    }
}

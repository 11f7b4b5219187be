//! The category model, used to label transactions for reporting.

use std::str::FromStr;

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Alias for the integer type used for category ids.
pub type CategoryId = i64;

/// The error returned when a string is not a valid category type tag.
#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid category type")]
pub struct ParseCategoryTypeError(String);

/// Whether a category labels money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Labels income transactions.
    Income,
    /// Labels expense transactions.
    Expense,
}

impl CategoryType {
    /// The tag stored in the database for this category type.
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl FromStr for CategoryType {
    type Err = ParseCategoryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            other => Err(ParseCategoryTypeError(other.to_owned())),
        }
    }
}

/// A label for grouping transactions, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The id for the category.
    pub id: CategoryId,
    /// The category's unique name.
    pub name: String,
    /// Whether the category labels income or expenses.
    pub category_type: CategoryType,
    /// Whether the category was seeded at start-up rather than created by
    /// the user.
    pub is_default: bool,
}

/// Create the category table if it does not exist.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            category_type TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    Ok(())
}

/// The categories present in every fresh database.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType); 10] = [
    ("Salary", CategoryType::Income),
    ("Interest", CategoryType::Income),
    ("Other Income", CategoryType::Income),
    ("Groceries", CategoryType::Expense),
    ("Rent", CategoryType::Expense),
    ("Utilities", CategoryType::Expense),
    ("Transport", CategoryType::Expense),
    ("Dining Out", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
    ("Other", CategoryType::Expense),
];

/// Insert the default categories, skipping any whose name already exists.
///
/// Safe to call on every start-up.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    for (name, category_type) in DEFAULT_CATEGORIES {
        connection.execute(
            "INSERT OR IGNORE INTO category (name, category_type, is_default) VALUES (?1, ?2, 1)",
            params![name, category_type.as_str()],
        )?;
    }

    Ok(())
}

pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_category_type: String = row.get(2)?;
    let category_type = raw_category_type
        .parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type,
        is_default: row.get(3)?,
    })
}

/// Get all categories, ordered by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, category_type, is_default FROM category ORDER BY name")?
        .query_map([], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

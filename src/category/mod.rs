//! Categories label transactions for reporting. A fixed set of defaults is
//! seeded into every fresh database; users can add and remove their own.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    Category, CategoryId, CategoryType, DEFAULT_CATEGORIES, create_category_table,
    get_all_categories, seed_default_categories,
};
pub use create_endpoint::{CategoryForm, create_category, create_category_endpoint};
pub use delete_endpoint::{delete_category, delete_category_endpoint};
pub use list_endpoint::get_categories_endpoint;

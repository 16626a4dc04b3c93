//! Data layer module
//!
//! SQLite connection pool guard and persistent models.

mod database;
mod models;

pub use database::Database;
pub use models::User;

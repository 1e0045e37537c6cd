//! Persistent store for stable address bindings.
//!
//! A SQLite file under the data directory holds one row per
//! (environment, location, traffic class). Writers take IMMEDIATE
//! transactions so concurrent deployment runs serialize on the store.
//!
//! # Examples
//!
//! ```no_run
//! use stackplan::database::{Database, DatabaseConfig};
//!
//! let db = Database::open(DatabaseConfig::new("/tmp/bindings.db")).unwrap();
//! for binding in Database::list_bindings(db.connection(), Some("production"), None).unwrap() {
//!     println!("{} -> {}", binding.key, binding.address);
//! }
//! ```

mod config;
mod connection;
pub mod migrations;
mod operations;
mod schema;
mod transaction;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{
    database_path, default_data_dir, resolve_data_dir, DatabaseConfig, DATABASE_FILE_NAME,
    DATA_DIR_ENV,
};
pub use connection::Database;
pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};

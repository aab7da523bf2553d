//! Hostlink Store
//!
//! SQLite-backed key/value persistence for application data.
//! Values are arbitrary JSON; every write is a single statement, so each one is atomic.

mod error;
mod migrations;
mod store;

pub use error::StorageError;
pub use store::Store;

pub type Result<T> = std::result::Result<T, StorageError>;

pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod ledger_repo;

pub use database::DbClient;
pub use catalog_repo::PgCatalogRepository;
pub use ledger_repo::PgLedgerRepository;

use reel_core::BookingError;

/// Translate a driver error into the ledger's error vocabulary.
pub(crate) fn storage_error(err: sqlx::Error) -> BookingError {
    match &err {
        sqlx::Error::Database(db) if db.code().is_some_and(|c| c.starts_with("23")) => {
            BookingError::invariant(format!("integrity violation: {}", db.message()))
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some("55P03") => {
            BookingError::StorageUnavailable(format!("lock wait exceeded: {}", db.message()))
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some("57014") => {
            BookingError::StorageUnavailable(format!("statement timed out: {}", db.message()))
        }
        _ => BookingError::StorageUnavailable(err.to_string()),
    }
}

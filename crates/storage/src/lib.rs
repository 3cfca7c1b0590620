#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryLedgerStore, LedgerRecord, LedgerStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteLedgerStore};

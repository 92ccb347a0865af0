use std::path::PathBuf;

use thiserror::Error;

use crate::consts::consts::ContactId;
use crate::model::contact::Contact;

use super::{file::FileBackend, table::TableBackend};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O failure during {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL failure during {operation}: {source}")]
    Sql {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to prepare the address_book schema: {0}")]
    Schema(rusqlite::Error),

    #[error("Malformed row {user_id} in the address_book table: {detail}")]
    MalformedRow { user_id: i64, detail: String },
}

impl PersistenceError {
    pub(crate) fn io(operation: &'static str) -> impl FnOnce(std::io::Error) -> PersistenceError {
        move |source| PersistenceError::Io { operation, source }
    }

    pub(crate) fn sql(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> PersistenceError {
        move |source| PersistenceError::Sql { operation, source }
    }
}

/// Outcome of a row-level record operation. `NeedsFullSave` tells the caller
/// to fall back to the bulk rewrite: always for the file backend (which has
/// no row granularity), and for the table backend when the targeted row has
/// gone missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    NeedsFullSave,
}

/// Durable representation of the store, polymorphic over the two concrete
/// strategies and selected by configuration, never recompilation.
///
/// Adapters hold configuration and connections only; contacts are never
/// cached across calls.
pub trait PersistenceAdapter {
    /// Idempotent preparation (data directory / table creation). Calling it
    /// against already-prepared storage succeeds.
    fn init(&mut self) -> PersistenceResult<()>;

    /// Full read of the durable set. Must either produce the whole set or
    /// fail without a partial result.
    fn load(&mut self) -> PersistenceResult<Vec<Contact>>;

    /// Full rewrite of the durable set.
    fn save(&mut self, contacts: &[Contact]) -> PersistenceResult<()>;

    fn record_create(&mut self, contact: &Contact) -> PersistenceResult<RecordOutcome>;
    fn record_update(&mut self, contact: &Contact) -> PersistenceResult<RecordOutcome>;
    fn record_delete(&mut self, id: ContactId) -> PersistenceResult<RecordOutcome>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageEngine {
    /// Pipe-delimited text file, one contact per line
    File(PathBuf),
    /// Single-file SQLite database holding the address_book table
    Table(PathBuf),
}

pub fn new_adapter(engine: &StorageEngine) -> PersistenceResult<Box<dyn PersistenceAdapter>> {
    match engine {
        StorageEngine::File(path) => Ok(Box::new(FileBackend::new(path.clone()))),
        StorageEngine::Table(path) => Ok(Box::new(TableBackend::open(path)?)),
    }
}

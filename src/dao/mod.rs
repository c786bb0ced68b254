//! Durable storage of encounter records.

/// JSON-file-backed record store.
pub mod json_store;
/// Persisted record definitions and validation.
pub mod models;
/// Errors shared by storage backends.
pub mod storage;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;
use crate::state::game::GameRecord;

/// Abstraction over durable storage for every encounter record, not just the
/// active one. Records are keyed by their integer id.
pub trait GameStore: Send + Sync {
    /// Insert `record` under the next free identifier (`1 + max(existing)`,
    /// `1` on an empty store) and return it with that id assigned. Allocation
    /// and insertion are atomic with respect to every other write, so two
    /// concurrent creates can never share an id.
    fn create(&self, record: GameRecord) -> BoxFuture<'static, StorageResult<GameRecord>>;

    /// Fetch one record by id.
    fn find(&self, id: u32) -> BoxFuture<'static, StorageResult<Option<GameRecord>>>;

    /// Upsert a record by id and rewrite the whole collection.
    fn save(&self, record: GameRecord) -> BoxFuture<'static, StorageResult<()>>;

    /// Load every stored record. A missing or malformed collection yields an
    /// empty list rather than an error (lossy but available); I/O failures
    /// other than absence are reported.
    fn load_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameRecord>>>;
}

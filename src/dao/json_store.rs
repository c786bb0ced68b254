//! Record store backed by a single JSON collection file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::warn;

use crate::dao::GameStore;
use crate::dao::models::GameRecordEntity;
use crate::dao::storage::{StorageError, StorageResult};
use crate::state::game::GameRecord;

/// [`GameStore`] persisting the whole collection to one JSON file.
///
/// Every write re-reads the collection, applies the change, and writes the
/// file back in full. Writes are serialized through an internal gate, and id
/// allocation happens under the same gate; this is safe under the
/// single-process assumption but a multi-process deployment would need file
/// locking on top.
#[derive(Clone)]
pub struct JsonFileStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    write_gate: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store over the given collection file. The file and its parent
    /// directory are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                write_gate: Mutex::new(()),
            }),
        }
    }
}

impl GameStore for JsonFileStore {
    fn create(&self, record: GameRecord) -> BoxFuture<'static, StorageResult<GameRecord>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            // The gate spans read-assign-write so concurrent creates can
            // never observe the same max id.
            let _gate = inner.write_gate.lock().await;

            let mut entities = read_entities(&inner.path).await?;
            let id = entities.iter().map(|entity| entity.id).max().unwrap_or(0) + 1;
            let record = record.with_id(id);
            entities.push(GameRecordEntity::from(&record));
            write_entities(&inner.path, &entities).await?;
            Ok(record)
        })
    }

    fn find(&self, id: u32) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let records = load_records(&inner.path).await?;
            Ok(records.into_iter().find(|record| record.id() == id))
        })
    }

    fn save(&self, record: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _gate = inner.write_gate.lock().await;

            let mut entities = read_entities(&inner.path).await?;
            let entity = GameRecordEntity::from(&record);
            match entities.iter_mut().find(|existing| existing.id == entity.id) {
                Some(existing) => *existing = entity,
                None => entities.push(entity),
            }
            write_entities(&inner.path, &entities).await
        })
    }

    fn load_all(&self) -> BoxFuture<'static, StorageResult<Vec<GameRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move { load_records(&inner.path).await })
    }
}

/// Read the raw collection. A missing file is an empty collection and
/// malformed JSON degrades to empty with a warning; any other read failure is
/// surfaced so a write path cannot clobber a collection it could not read.
async fn read_entities(path: &Path) -> StorageResult<Vec<GameRecordEntity>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_str(&contents) {
        Ok(entities) => Ok(entities),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "record store is malformed; treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Serialize and write the whole collection, creating the parent directory on
/// first use.
async fn write_entities(path: &Path, entities: &[GameRecordEntity]) -> StorageResult<()> {
    let contents =
        serde_json::to_string_pretty(entities).map_err(|source| StorageError::Encode { source })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, contents)
        .await
        .map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Load and validate the whole collection. Any invalid record discards the
/// collection (logged, never a crash).
async fn load_records(path: &Path) -> StorageResult<Vec<GameRecord>> {
    let entities = read_entities(path).await?;
    let mut records = Vec::with_capacity(entities.len());
    for entity in entities {
        match GameRecord::try_from(entity) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "invalid record in store; treating collection as empty");
                return Ok(Vec::new());
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::Story;
    use time::macros::datetime;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("games.json"))
    }

    fn record(id: u32, players: u32) -> GameRecord {
        GameRecord::new(id, players, Story::CrashSite, datetime!(2024-03-01 12:00 UTC))
    }

    #[tokio::test]
    async fn create_on_an_empty_store_assigns_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let created = store.create(record(0, 2)).await.unwrap();
        assert_eq!(created.id(), 1);
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_skips_id_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(record(3, 2)).await.unwrap();
        let created = store.create(record(0, 2)).await.unwrap();
        assert_eq!(created.id(), 4);
    }

    #[tokio::test]
    async fn concurrent_creates_never_share_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = store.create(record(0, 2));
        let second = store.create(record(0, 4));
        let (first, second) = tokio::join!(first, second);
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.id(), second.id());
        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn save_then_load_preserves_derived_behavior() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut game = record(1, 4);
        game.deal_damage(23);
        game.place_clues(4);
        game.gain_counter_measures(2);
        store.save(game.clone()).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].remaining_health(), game.remaining_health());
        assert_eq!(loaded[0].clue_threshold(), game.clue_threshold());
        assert_eq!(loaded[0], game);
    }

    #[tokio::test]
    async fn save_upserts_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut game = record(1, 2);
        store.save(game.clone()).await.unwrap();
        game.deal_damage(5);
        store.save(game.clone()).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].damage_dealt(), 5);
    }

    #[tokio::test]
    async fn find_resolves_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(record(1, 2)).await.unwrap();
        store.save(record(2, 3)).await.unwrap();

        let found = store.find(2).await.unwrap().unwrap();
        assert_eq!(found.number_of_players(), 3);
        assert!(store.find(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_collection_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        tokio::fs::write(&path, "{ this is not json ]").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.create(record(0, 2)).await.unwrap().id(), 1);
    }

    #[tokio::test]
    async fn invalid_record_discards_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        let raw = r#"[{"id":1,"dateCreated":"2024-03-01T12:00:00Z","numberOfPlayers":0,
            "damageDealt":0,"cluesPlaced":0,"counterMeasures":0}]"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_player_count_degrades_instead_of_crashing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        let raw = r#"[{"id":1,"dateCreated":"2024-03-01T12:00:00Z","numberOfPlayers":4294967295,
            "damageDealt":0,"cluesPlaced":0,"counterMeasures":0}]"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_store_surfaces_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        // A directory at the collection path fails reads with something other
        // than NotFound.
        tokio::fs::create_dir(&path).await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_all().await,
            Err(StorageError::Read { .. })
        ));
        assert!(matches!(
            store.create(record(0, 2)).await,
            Err(StorageError::Read { .. })
        ));
    }
}

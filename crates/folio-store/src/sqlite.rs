//! SQLite fact store.
//!
//! One row per live fact, plus a `meta` table for the `initialized`
//! sentinel. Payloads are stored as JSON in the same shape editors exchange;
//! referenced entities are denormalized into `value_ref` so reverse scans hit
//! an index.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use folio_types::{Attribute, Cardinality, EntityId, Fact, FactId};

use crate::ops::{FactRead, FactStore};
use crate::{StoreError, StoreResult};

const SCHEMA: &str = r#"
-- Facts (seq preserves insertion order for scans)
CREATE TABLE IF NOT EXISTS facts (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    entity TEXT NOT NULL,
    attribute TEXT NOT NULL,
    value_ref TEXT,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_facts_eav ON facts(entity, attribute, seq);
CREATE INDEX IF NOT EXISTS idx_facts_vae ON facts(value_ref, attribute, seq);

-- Store-level flags
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const INITIALIZED_KEY: &str = "initialized";

/// Fact store backed by a SQLite database.
pub struct SqliteFactStore {
    conn: Mutex<Connection>,
}

impl SqliteFactStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query(&self, sql: &str, args: impl rusqlite::Params) -> StoreResult<Vec<Fact>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, raw_row)?;
        let mut facts = Vec::new();
        for row in rows {
            facts.push(decode(row?)?);
        }
        Ok(facts)
    }
}

/// Columns as stored, before parsing.
struct RawFact {
    id: String,
    entity: String,
    attribute: String,
    data: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawFact> {
    Ok(RawFact {
        id: row.get(0)?,
        entity: row.get(1)?,
        attribute: row.get(2)?,
        data: row.get(3)?,
    })
}

fn decode(raw: RawFact) -> StoreResult<Fact> {
    let id = FactId::parse(&raw.id)
        .map_err(|e| StoreError::corrupt(format!("fact id {}: {e}", raw.id)))?;
    let entity = EntityId::parse(&raw.entity)
        .map_err(|e| StoreError::corrupt(format!("entity {}: {e}", raw.entity)))?;
    let attribute = Attribute::from_str(&raw.attribute)
        .ok_or_else(|| StoreError::corrupt(format!("unknown attribute {}", raw.attribute)))?;
    let data = serde_json::from_str(&raw.data)?;
    Ok(Fact {
        id,
        entity,
        attribute,
        data,
    })
}

#[async_trait]
impl FactRead for SqliteFactStore {
    async fn is_initialized(&self) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let flag: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![INITIALIZED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(flag.is_some())
    }

    async fn scan_eav(&self, entity: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>> {
        self.query(
            "SELECT id, entity, attribute, data FROM facts
             WHERE entity = ?1 AND attribute = ?2 ORDER BY seq",
            params![entity.to_string(), attribute.as_str()],
        )
    }

    async fn scan_vae(&self, value: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>> {
        self.query(
            "SELECT id, entity, attribute, data FROM facts
             WHERE value_ref = ?1 AND attribute = ?2 ORDER BY seq",
            params![value.to_string(), attribute.as_str()],
        )
    }

    async fn entity_facts(&self, entity: EntityId) -> StoreResult<Vec<Fact>> {
        self.query(
            "SELECT id, entity, attribute, data FROM facts WHERE entity = ?1 ORDER BY seq",
            params![entity.to_string()],
        )
    }

    async fn all_facts(&self) -> StoreResult<Vec<Fact>> {
        self.query(
            "SELECT id, entity, attribute, data FROM facts ORDER BY seq",
            params![],
        )
    }
}

#[async_trait]
impl FactStore for SqliteFactStore {
    async fn set_initialized(&self) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, 'true')",
            params![INITIALIZED_KEY],
        )?;
        Ok(())
    }

    async fn put_fact(&self, fact: Fact) -> StoreResult<()> {
        fact.validate()?;
        let data = serde_json::to_string(&fact.data)?;
        let id = fact.id.to_string();
        let entity = fact.entity.to_string();
        let value_ref = fact.data.referenced_entity().map(|e| e.to_string());

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        if fact.attribute.cardinality() == Cardinality::One {
            tx.execute(
                "DELETE FROM facts WHERE entity = ?1 AND attribute = ?2 AND id != ?3",
                params![entity, fact.attribute.as_str(), id],
            )?;
        }
        // Upsert keeps the original seq when the id already exists.
        tx.execute(
            "INSERT INTO facts (id, entity, attribute, value_ref, data)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                entity = excluded.entity,
                attribute = excluded.attribute,
                value_ref = excluded.value_ref,
                data = excluded.data",
            params![id, entity, fact.attribute.as_str(), value_ref, data],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn retract_fact(&self, id: FactId) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM facts WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    async fn retract_attribute(&self, entity: EntityId, attribute: Attribute) -> StoreResult<()> {
        self.conn.lock().execute(
            "DELETE FROM facts WHERE entity = ?1 AND attribute = ?2",
            params![entity.to_string(), attribute.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use folio_types::{BlockType, FactData};

    use super::*;
    use crate::ops::BlockPosition;

    #[tokio::test]
    async fn test_initialized_flag() {
        let store = SqliteFactStore::in_memory().unwrap();
        assert!(!store.is_initialized().await.unwrap());
        store.set_initialized().await.unwrap();
        assert!(store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_and_scan() {
        let store = SqliteFactStore::in_memory().unwrap();
        let e = EntityId::new();
        let fact = Fact::new(
            e,
            Attribute::BlockType,
            FactData::BlockType {
                value: BlockType::Heading,
            },
        );
        store.put_fact(fact.clone()).await.unwrap();

        let facts = store.scan_eav(e, Attribute::BlockType).await.unwrap();
        assert_eq!(facts, vec![fact]);
    }

    #[tokio::test]
    async fn test_single_valued_upsert() {
        let store = SqliteFactStore::in_memory().unwrap();
        let e = EntityId::new();
        store
            .assert_fact(e, Attribute::ListNumber, FactData::Number { value: 1 })
            .await
            .unwrap();
        store
            .assert_fact(e, Attribute::ListNumber, FactData::Number { value: 2 })
            .await
            .unwrap();

        let facts = store.scan_eav(e, Attribute::ListNumber).await.unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].data.as_number(), Some(2));
    }

    #[tokio::test]
    async fn test_structural_move_through_sqlite() {
        let store = SqliteFactStore::in_memory().unwrap();
        let root = EntityId::new();
        let [a, b] = [EntityId::new(), EntityId::new()];
        store.put_fact(Fact::child(root, a, "1")).await.unwrap();
        store.put_fact(Fact::child(root, b, "2")).await.unwrap();

        store
            .move_block(a, root, root, BlockPosition::End)
            .await
            .unwrap();

        let order: Vec<EntityId> = store
            .children(root)
            .await
            .unwrap()
            .iter()
            .filter_map(|f| f.data.referenced_entity())
            .collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(store.scan_vae(a, Attribute::CardBlock).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.db");
        let e = EntityId::new();

        {
            let store = SqliteFactStore::open(&path).unwrap();
            store.set_initialized().await.unwrap();
            store
                .assert_fact(e, Attribute::IsList, FactData::Boolean { value: true })
                .await
                .unwrap();
        }

        let store = SqliteFactStore::open(&path).unwrap();
        assert!(store.is_initialized().await.unwrap());
        assert_eq!(
            store.value(e, Attribute::IsList).await.unwrap(),
            Some(FactData::Boolean { value: true })
        );
    }

    #[tokio::test]
    async fn test_corrupt_attribute_is_reported() {
        let store = SqliteFactStore::in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO facts (id, entity, attribute, data) VALUES (?1, ?2, 'block/bogus', '{}')",
                params![FactId::new().to_string(), EntityId::new().to_string()],
            )
            .unwrap();

        assert!(matches!(
            store.all_facts().await,
            Err(StoreError::Corrupt(_))
        ));
    }
}

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use crate::error::Result;
use crate::storage::{CollectionTarget, ResultStore};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_db()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collection_documents (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data_key TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                PRIMARY KEY (collection, doc_id)
            );

            CREATE TABLE IF NOT EXISTS collection_items (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data_key TEXT NOT NULL,
                position INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (collection, doc_id, data_key, position)
            );
            "#,
        )?;

        Ok(())
    }

    fn touch(conn: &Connection, target: CollectionTarget) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO collection_documents (collection, doc_id, data_key, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, doc_id) DO UPDATE SET
                data_key = excluded.data_key,
                last_updated = excluded.last_updated
            "#,
            params![
                target.collection,
                target.doc_id,
                target.data_key,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl ResultStore for SqliteStore {
    fn reset(&self, target: CollectionTarget) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM collection_items WHERE collection = ?1 AND doc_id = ?2 AND data_key = ?3",
            params![target.collection, target.doc_id, target.data_key],
        )?;
        Self::touch(&tx, target)?;
        tx.commit()?;
        Ok(())
    }

    fn append(&self, target: CollectionTarget, chunk: &[Value]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let next: i64 = tx.query_row(
            r#"
            SELECT COALESCE(MAX(position) + 1, 0) FROM collection_items
            WHERE collection = ?1 AND doc_id = ?2 AND data_key = ?3
            "#,
            params![target.collection, target.doc_id, target.data_key],
            |row| row.get(0),
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO collection_items (collection, doc_id, data_key, position, payload)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;

            for (offset, value) in chunk.iter().enumerate() {
                let payload = serde_json::to_string(value)?;
                stmt.execute(params![
                    target.collection,
                    target.doc_id,
                    target.data_key,
                    next + offset as i64,
                    payload,
                ])?;
            }
        }

        Self::touch(&tx, target)?;
        tx.commit()?;
        Ok(())
    }

    fn load(&self, target: CollectionTarget) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT payload FROM collection_items
            WHERE collection = ?1 AND doc_id = ?2 AND data_key = ?3
            ORDER BY position
            "#,
        )?;

        let payloads = stmt.query_map(
            params![target.collection, target.doc_id, target.data_key],
            |row| row.get::<_, String>(0),
        )?;

        let mut values = Vec::new();
        for payload in payloads {
            values.push(serde_json::from_str(&payload?)?);
        }
        Ok(values)
    }

    fn last_updated(&self, target: CollectionTarget) -> Result<Option<DateTime<Utc>>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT last_updated FROM collection_documents WHERE collection = ?1 AND doc_id = ?2",
                params![target.collection, target.doc_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stamp.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FORECASTS, TRENDS};
    use serde_json::json;

    #[test]
    fn test_append_preserves_order_across_chunks() {
        let store = SqliteStore::in_memory().unwrap();
        store.reset(TRENDS).unwrap();
        store.append(TRENDS, &[json!({"skill": "a"}), json!({"skill": "b"})]).unwrap();
        store.append(TRENDS, &[json!({"skill": "c"})]).unwrap();

        let loaded = store.load(TRENDS).unwrap();
        assert_eq!(
            loaded,
            vec![json!({"skill": "a"}), json!({"skill": "b"}), json!({"skill": "c"})]
        );
    }

    #[test]
    fn test_collections_are_independent() {
        let store = SqliteStore::in_memory().unwrap();
        store.reset(TRENDS).unwrap();
        store.append(TRENDS, &[json!(1)]).unwrap();
        store.reset(FORECASTS).unwrap();

        assert_eq!(store.load(TRENDS).unwrap(), vec![json!(1)]);
        assert!(store.load(FORECASTS).unwrap().is_empty());
    }

    #[test]
    fn test_missing_document_has_no_timestamp() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.last_updated(TRENDS).unwrap().is_none());
        assert!(store.load(TRENDS).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skilltrend.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.reset(FORECASTS).unwrap();
            store.append(FORECASTS, &[json!({"skill": "sql"})]).unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.load(FORECASTS).unwrap(), vec![json!({"skill": "sql"})]);
        assert!(reopened.last_updated(FORECASTS).unwrap().is_some());
    }
}

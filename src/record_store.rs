use crate::error::Result;
use crate::models::FavoriteRecord;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same id already exists; nothing was written.
    Conflict,
}

/// Keyed local persistence for saved media records.
pub trait MediaRecordStore: Send + Sync {
    fn exists(&self, id: i64) -> Result<bool>;
    fn insert(&self, record: &FavoriteRecord) -> Result<InsertOutcome>;
    fn get(&self, id: i64) -> Result<Option<FavoriteRecord>>;
    /// Newest first.
    fn list(&self) -> Result<Vec<FavoriteRecord>>;
    fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        info!("Favorites database opened at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS favorites (
                id              INTEGER PRIMARY KEY,
                title           TEXT NOT NULL,
                image_file      TEXT NOT NULL,
                overview        TEXT NOT NULL,
                vote_average    REAL NOT NULL,
                saved_at        TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_favorites_saved_at ON favorites(saved_at DESC);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves the connection itself usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<FavoriteRecord> {
        Ok(FavoriteRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            image_file: row.get("image_file")?,
            overview: row.get("overview")?,
            vote_average: row.get("vote_average")?,
            saved_at: row.get("saved_at")?,
        })
    }
}

impl MediaRecordStore for SqliteRecordStore {
    fn exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM favorites WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, record: &FavoriteRecord) -> Result<InsertOutcome> {
        let changed = self.conn().execute(
            "INSERT OR IGNORE INTO favorites (id, title, image_file, overview, vote_average, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.title,
                record.image_file,
                record.overview,
                record.vote_average,
                record.saved_at
            ],
        )?;
        Ok(if changed == 0 {
            InsertOutcome::Conflict
        } else {
            InsertOutcome::Inserted
        })
    }

    fn get(&self, id: i64) -> Result<Option<FavoriteRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT id, title, image_file, overview, vote_average, saved_at
                 FROM favorites WHERE id = ?1",
                params![id],
                |row| Self::row_to_record(row),
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<FavoriteRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, image_file, overview, vote_average, saved_at
             FROM favorites ORDER BY saved_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| Self::row_to_record(row))?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(id: i64, title: &str) -> FavoriteRecord {
        FavoriteRecord {
            id,
            title: title.to_string(),
            image_file: format!("{title}.jpg"),
            overview: "overview".to_string(),
            vote_average: 7.5,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_exists_and_get() {
        let store = SqliteRecordStore::open_in_memory().expect("store");
        assert!(!store.exists(42).unwrap());

        let rec = record(42, "Dune");
        assert_eq!(store.insert(&rec).unwrap(), InsertOutcome::Inserted);
        assert!(store.exists(42).unwrap());
        assert_eq!(store.get(42).unwrap(), Some(rec));
        assert_eq!(store.get(43).unwrap(), None);
    }

    #[test]
    fn second_insert_for_same_id_is_rejected() {
        let store = SqliteRecordStore::open_in_memory().expect("store");
        store.insert(&record(1, "First")).unwrap();
        assert_eq!(
            store.insert(&record(1, "Second")).unwrap(),
            InsertOutcome::Conflict
        );
        assert_eq!(store.get(1).unwrap().unwrap().title, "First");
    }

    #[test]
    fn lists_newest_first_and_deletes() {
        let store = SqliteRecordStore::open_in_memory().expect("store");
        let mut older = record(1, "Older");
        older.saved_at = Utc::now() - Duration::minutes(5);
        store.insert(&older).unwrap();
        store.insert(&record(2, "Newer")).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);

        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("favorites.db");
        {
            let store = SqliteRecordStore::open(&path).expect("open");
            store.insert(&record(9, "Heat")).unwrap();
        }
        let store = SqliteRecordStore::open(&path).expect("reopen");
        assert!(store.exists(9).unwrap());
    }
}

use crate::error::{FiresightError, Result};
use crate::model::{CommitChanges, CommitInfo, SCHEMA_VERSION};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub const CACHE_DIR: &str = ".firesight";

/// Per-repository store of already diffed commits.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, RP: AsRef<Path>>(cache_path: Option<CP>, repo_path: RP) -> Result<Self> {
        let cache_dir = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => repo_path.as_ref().join(CACHE_DIR),
        };
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("cache.db");
        debug!(path = %db_path.display(), "opening commit cache");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    pub fn in_memory() -> Result<Self> {
        let mut cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS commits (
                id TEXT PRIMARY KEY,
                author_name TEXT NOT NULL,
                author_email TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                parent_ids TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS files (
                commit_id TEXT NOT NULL,
                path TEXT NOT NULL,
                PRIMARY KEY (commit_id, path),
                FOREIGN KEY (commit_id) REFERENCES commits(id)
            );
            CREATE INDEX IF NOT EXISTS idx_commits_timestamp ON commits(timestamp);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(FiresightError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Cached changes for `commit_id`, or `None` if it was never stored.
    pub fn get_commit(&self, commit_id: &str) -> Result<Option<CommitChanges>> {
        let info = self
            .conn
            .query_row(
                "SELECT id, author_name, author_email, timestamp, parent_ids FROM commits WHERE id = ?",
                params![commit_id],
                |row| {
                    let ts: i64 = row.get(3)?;
                    let timestamp = Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
                        rusqlite::Error::InvalidColumnType(
                            3,
                            "timestamp".to_string(),
                            rusqlite::types::Type::Integer,
                        )
                    })?;

                    let parent_json: String = row.get(4)?;
                    let parent_ids: Vec<String> = serde_json::from_str(&parent_json).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            parent_json.len(),
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                    Ok(CommitInfo {
                        id: row.get(0)?,
                        author_name: row.get(1)?,
                        author_email: row.get(2)?,
                        timestamp,
                        parent_ids,
                    })
                },
            )
            .optional()?;

        let Some(info) = info else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT path FROM files WHERE commit_id = ? ORDER BY path")?;
        let paths = stmt
            .query_map(params![commit_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(CommitChanges { info, paths }))
    }

    pub fn store_commits(&mut self, commits: &[CommitChanges]) -> Result<()> {
        let tx = self.conn.transaction()?;

        {
            let mut insert_commit_stmt = tx.prepare(
                "INSERT OR REPLACE INTO commits (id, author_name, author_email, timestamp, parent_ids)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            let mut delete_files_stmt = tx.prepare("DELETE FROM files WHERE commit_id = ?")?;
            let mut insert_file_stmt =
                tx.prepare("INSERT INTO files (commit_id, path) VALUES (?, ?)")?;

            for commit in commits {
                let info = &commit.info;
                insert_commit_stmt.execute(params![
                    info.id,
                    info.author_name,
                    info.author_email,
                    info.timestamp.timestamp(),
                    serde_json::to_string(&info.parent_ids)?
                ])?;

                delete_files_stmt.execute(params![info.id])?;

                let mut seen_paths: HashSet<&String> = HashSet::new();
                for path in &commit.paths {
                    if seen_paths.insert(path) {
                        insert_file_stmt.execute(params![info.id, path])?;
                    }
                }
            }
        }

        tx.commit()?;
        debug!(stored = commits.len(), "stored commits in cache");
        Ok(())
    }
}

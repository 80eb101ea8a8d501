use crate::{Diff, FileMode, ParseError};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("stored diff no longer parses: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid file mode: {0}")]
    InvalidMode(String),
    #[error("pull id {0} does not fit in a database integer")]
    PullIdOutOfRange(u64),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Per-file summary row of a stored diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub mode: FileMode,
    pub orig_name: String,
    pub new_name: String,
    pub similarity_index: u8,
    pub additions: u32,
    pub deletions: u32,
}

/// SQLite-backed store of parsed diffs.
///
/// The raw diff text is the source of truth and is keyed by its SHA-256, so
/// saving the same text twice yields the same id. File rows are a queryable
/// summary; loading re-parses the raw text.
pub struct DiffStore {
    conn: Connection,
}

impl DiffStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS diffs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pull_id INTEGER,
                raw_sha256 TEXT NOT NULL UNIQUE,
                raw TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             CREATE TABLE IF NOT EXISTS diff_files (
                diff_id INTEGER NOT NULL REFERENCES diffs(id) ON DELETE CASCADE,
                idx INTEGER NOT NULL,
                mode TEXT NOT NULL,
                orig_name TEXT NOT NULL,
                new_name TEXT NOT NULL,
                similarity_index INTEGER NOT NULL,
                additions INTEGER NOT NULL,
                deletions INTEGER NOT NULL,
                PRIMARY KEY (diff_id, idx)
             );
             CREATE INDEX IF NOT EXISTS diffs_pull_id ON diffs(pull_id);",
        )?;
        Ok(Self { conn })
    }

    /// Save a parsed diff and return its id.
    ///
    /// If the same raw text was saved before, its id is returned and only the
    /// pull id is updated (when one is given).
    pub fn save(&mut self, diff: &Diff, pull_id: Option<u64>) -> Result<i64> {
        let digest = raw_digest(&diff.raw);
        let pull_id = pull_id.map(pull_key).transpose()?;
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM diffs WHERE raw_sha256 = ?1",
                params![digest],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                if let Some(pull_id) = pull_id {
                    tx.execute(
                        "UPDATE diffs SET pull_id = ?1 WHERE id = ?2",
                        params![pull_id, id],
                    )?;
                }
                debug!("diff {digest} already stored as {id}");
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO diffs (pull_id, raw_sha256, raw) VALUES (?1, ?2, ?3)",
                    params![pull_id, digest, diff.raw],
                )?;
                let id = tx.last_insert_rowid();
                for (idx, file) in diff.files.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO diff_files
                            (diff_id, idx, mode, orig_name, new_name, similarity_index, additions, deletions)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            id,
                            idx as i64,
                            file.mode.as_str(),
                            file.orig_name,
                            file.new_name,
                            file.similarity_index,
                            file.additions,
                            file.deletions
                        ],
                    )?;
                }
                debug!("stored diff {digest} as {id} with {} file(s)", diff.files.len());
                id
            }
        };

        tx.commit()?;
        Ok(id)
    }

    /// Load a stored diff by re-parsing its raw text.
    pub fn load(&self, id: i64) -> Result<Option<Diff>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT raw FROM diffs WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(crate::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Per-file summary rows of a stored diff, in diff order.
    pub fn files(&self, id: i64) -> Result<Vec<StoredFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT mode, orig_name, new_name, similarity_index, additions, deletions
             FROM diff_files WHERE diff_id = ?1 ORDER BY idx",
        )?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    StoredFile {
                        mode: FileMode::Modified,
                        orig_name: row.get(1)?,
                        new_name: row.get(2)?,
                        similarity_index: row.get(3)?,
                        additions: row.get(4)?,
                        deletions: row.get(5)?,
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mode, file)| Ok(StoredFile { mode: mode_from_str(&mode)?, ..file }))
            .collect()
    }

    /// Ids of all diffs saved for a pull request, oldest first.
    pub fn find_by_pull(&self, pull_id: u64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM diffs WHERE pull_id = ?1 ORDER BY id")?;

        let ids = stmt
            .query_map(params![pull_key(pull_id)?], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    /// Delete a stored diff and its file rows. Returns whether it existed.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM diffs WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }
}

/// SQLite integers are signed 64-bit.
fn pull_key(pull_id: u64) -> Result<i64> {
    i64::try_from(pull_id).map_err(|_| StoreError::PullIdOutOfRange(pull_id))
}

/// Hex SHA-256 of the raw diff text.
fn raw_digest(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn mode_from_str(mode: &str) -> Result<FileMode> {
    match mode {
        "modified" => Ok(FileMode::Modified),
        "deleted" => Ok(FileMode::Deleted),
        "new" => Ok(FileMode::New),
        "renamed" => Ok(FileMode::Renamed),
        other => Err(StoreError::InvalidMode(other.to_owned())),
    }
}

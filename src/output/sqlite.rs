//! SQLite output
//!
//! Rows are appended to a `records` table, one row per flattened record,
//! with the user fields stored as a JSON object. Appending makes this the
//! format of choice for per-page saving.

use crate::extract::Record;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_number INTEGER NOT NULL,
    page_url TEXT NOT NULL,
    group_id INTEGER NOT NULL,
    group_index INTEGER NOT NULL,
    element_index INTEGER NOT NULL,
    data TEXT NOT NULL,
    saved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_page_url ON records(page_url);
"#;

/// An open output database
pub struct SqliteOutput {
    conn: Connection,
}

impl SqliteOutput {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Appends rows in a single transaction
    ///
    /// # Returns
    ///
    /// The number of rows inserted
    pub fn append(&mut self, rows: &[Record]) -> anyhow::Result<usize> {
        let saved_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO records
                    (page_number, page_url, group_id, group_index, element_index, data, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.page_number,
                    row.page_url,
                    row.group_id as i64,
                    row.group_index as i64,
                    row.element_index as i64,
                    serde_json::to_string(&row.data)?,
                    saved_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Total number of stored rows
    pub fn count(&self) -> rusqlite::Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get::<_, i64>(0))
            .map(|count| count as usize)
    }
}

/// Save handler for the `sqlite` and `db` formats
pub fn save_sqlite(rows: &[Record], path: Option<&Path>) -> anyhow::Result<bool> {
    let Some(path) = path else {
        anyhow::bail!("SQLite output requires an output path");
    };

    let mut output = SqliteOutput::open(path)?;
    let inserted = output.append(rows)?;
    tracing::debug!("Appended {} rows to {}", inserted, path.display());
    Ok(true)
}

// Table storage - one pretty-printed JSON array of rows per table

use crate::config::WriteMode;
use crate::error::Result;
use crate::schema::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-table row persistence. Every write replaces the whole file.
pub struct TableStorage {
    dir: PathBuf,
    write_mode: WriteMode,
}

impl TableStorage {
    pub fn new(dir: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        TableStorage {
            dir: dir.into(),
            write_mode,
        }
    }

    /// Path of the file backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    /// Load all rows of a table. A missing file reads as an empty table.
    pub fn load(&self, table: &str) -> Result<Vec<Row>> {
        let path = self.table_path(table);
        match read_json(&path)? {
            Some(rows) => Ok(rows),
            None => {
                log::debug!("No storage file for table '{table}', reading as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the stored rows of `table` with `rows`.
    pub fn persist(&self, table: &str, rows: &[Row]) -> Result<()> {
        let path = self.table_path(table);
        write_json(&path, &rows, self.write_mode)?;
        log::debug!("Persisted {} row(s) to {}", rows.len(), path.display());
        Ok(())
    }

    /// Empty the table but keep its file on disk.
    pub fn truncate(&self, table: &str) -> Result<()> {
        self.persist(table, &[])
    }
}

/// Read and deserialize a JSON document. Returns `None` if the file is missing.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Serialize `value` as pretty JSON and write it to `path` as a whole.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    mode: WriteMode,
) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    match mode {
        WriteMode::Overwrite => {
            std::fs::write(path, &bytes)?;
        }
        WriteMode::Atomic => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(path).map_err(|e| e.error)?;
        }
    }
    Ok(())
}

use crate::config::WriteMode;
use crate::error::Result;
use crate::schema::Catalog;
use crate::storage::{read_json, write_json};
use std::path::{Path, PathBuf};

/// The metadata document: table schemas and id counters, stored as one JSON file.
pub struct MetaStore {
    path: PathBuf,
    write_mode: WriteMode,
}

impl MetaStore {
    pub fn new(path: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        MetaStore {
            path: path.into(),
            write_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog. A missing document is an empty catalog.
    pub fn load(&self) -> Result<Catalog> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Overwrite the whole document with `catalog`.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        write_json(&self.path, catalog, self.write_mode)?;
        log::debug!(
            "Saved metadata for {} table(s) to {}",
            catalog.len(),
            self.path.display()
        );
        Ok(())
    }
}

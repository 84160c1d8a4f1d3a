use std::path::PathBuf;

/// Default directory holding the metadata document and table files.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default file name of the metadata document inside the data directory.
pub const DEFAULT_META_FILE: &str = "db_meta.json";

/// How whole-file writes reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write a temporary file next to the target, then rename it into place.
    /// A crash leaves either the old or the new document, never a torn one.
    #[default]
    Atomic,
    /// Truncate the target and write in place.
    Overwrite,
}

/// Settings for opening a [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub data_dir: PathBuf,
    pub meta_file: String,
    pub write_mode: WriteMode,
}

impl DbConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        DbConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Full path of the metadata document.
    pub fn meta_path(&self) -> PathBuf {
        self.data_dir.join(&self.meta_file)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            meta_file: DEFAULT_META_FILE.to_string(),
            write_mode: WriteMode::default(),
        }
    }
}

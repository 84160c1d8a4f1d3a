use crate::schema::Row;
use std::collections::HashMap;

/// Hit/miss counters of a [`ReadCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Full-table read cache. An entry lives until its table is written to.
/// Unbounded, no expiry.
#[derive(Debug, Default)]
pub struct ReadCache {
    entries: HashMap<String, Vec<Row>>,
    stats: CacheStats,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rows for `table`, counting the lookup as a hit or a miss.
    pub fn lookup(&mut self, table: &str) -> Option<&Vec<Row>> {
        match self.entries.get(table) {
            Some(rows) => {
                self.stats.hits += 1;
                log::debug!("Cache hit for table '{table}'");
                Some(rows)
            }
            None => {
                self.stats.misses += 1;
                log::debug!("Cache miss for table '{table}'");
                None
            }
        }
    }

    pub fn store(&mut self, table: &str, rows: Vec<Row>) {
        self.entries.insert(table.to_string(), rows);
    }

    /// Drop the entry for `table` only.
    pub fn invalidate(&mut self, table: &str) {
        if self.entries.remove(table).is_some() {
            log::debug!("Invalidated cache entry for table '{table}'");
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

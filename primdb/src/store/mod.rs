use crate::cache::ReadCache;
use crate::config::DbConfig;
use crate::error::{PrimDbError, Result};
use crate::meta::MetaStore;
use crate::schema::{
    parse_columns, row_id, validate_name, Catalog, FieldValues, Row, TableSchema, ID_COLUMN,
};
use crate::storage::TableStorage;
use crate::validation;
use indexmap::IndexMap;

/// Rows returned by [`Database::select_with_cache`], tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub rows: Vec<Row>,
    pub from_cache: bool,
}

/// The main entry point for primdb.
/// Owns the metadata document, the per-table files and a read cache for
/// one session. Metadata is re-read at the start of every operation.
pub struct Database {
    config: DbConfig,
    meta: MetaStore,
    storage: TableStorage,
    cache: ReadCache,
}

impl Database {
    /// Open a database in `config.data_dir`, creating the directory if needed.
    pub fn open(config: DbConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let meta = MetaStore::new(config.meta_path(), config.write_mode);
        let storage = TableStorage::new(&config.data_dir, config.write_mode);

        log::info!(
            "Opened database at {} ({:?} writes)",
            config.data_dir.display(),
            config.write_mode
        );

        Ok(Database {
            config,
            meta,
            storage,
            cache: ReadCache::new(),
        })
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    // ── Tables ─────────────────────────────────────────────────────

    /// Create a table with the given `name -> type` columns.
    /// The `id:int` column is prepended and the id counter starts at 1.
    pub fn create_table(
        &mut self,
        name: &str,
        columns: &IndexMap<String, String>,
    ) -> Result<TableSchema> {
        validate_name("table", name)?;
        if self.storage.table_path(name) == self.config.meta_path() {
            return Err(PrimDbError::ReservedTableName(name.to_string()));
        }

        let mut catalog = self.meta.load()?;
        if catalog.contains(name) {
            return Err(PrimDbError::TableAlreadyExists(name.to_string()));
        }

        let schema = TableSchema::new(parse_columns(columns)?);
        catalog.insert(name.to_string(), schema.clone());
        self.meta.save(&catalog)?;

        self.storage.persist(name, &[])?;
        self.cache.invalidate(name);

        log::info!(
            "Created table '{name}' with columns: {}",
            schema
                .columns
                .iter()
                .map(|(col, ty)| format!("{col}:{ty}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(schema)
    }

    /// Remove a table from the metadata. Its file is emptied but stays on disk.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let mut catalog = self.meta.load()?;
        if catalog.remove(name).is_none() {
            return Err(PrimDbError::TableNotFound(name.to_string()));
        }
        self.meta.save(&catalog)?;

        self.storage.truncate(name)?;
        self.cache.invalidate(name);

        log::info!("Dropped table '{name}'");
        Ok(())
    }

    /// All table schemas, in creation order.
    pub fn list_tables(&self) -> Result<Catalog> {
        self.meta.load()
    }

    /// Schema of a single table.
    pub fn describe_table(&self, name: &str) -> Result<TableSchema> {
        let catalog = self.meta.load()?;
        catalog
            .get(name)
            .cloned()
            .ok_or_else(|| PrimDbError::TableNotFound(name.to_string()))
    }

    // ── Rows ───────────────────────────────────────────────────────

    /// Insert a row. Omitted columns are stored as null. Returns the new id.
    pub fn insert_row(&mut self, table: &str, values: &FieldValues) -> Result<u64> {
        let mut catalog = self.meta.load()?;
        let schema = catalog
            .get_mut(table)
            .ok_or_else(|| PrimDbError::TableNotFound(table.to_string()))?;

        let mut coerced = validation::coerce_values(table, schema, values)?;

        let id = schema.next_id;
        let mut row = Row::with_capacity(schema.columns.len());
        row.insert(ID_COLUMN.to_string(), id.into());
        for (column, _) in schema.data_columns() {
            let value = coerced.shift_remove(column).unwrap_or(serde_json::Value::Null);
            row.insert(column.to_string(), value);
        }

        let mut rows = self.storage.load(table)?;
        rows.push(row);
        self.storage.persist(table, &rows)?;
        self.cache.invalidate(table);

        schema.next_id += 1;
        self.meta.save(&catalog)?;

        log::debug!("Inserted row id={id} into '{table}'");
        Ok(id)
    }

    /// All rows of a table, unfiltered, read from disk.
    pub fn select_rows(&self, table: &str) -> Result<Vec<Row>> {
        let catalog = self.meta.load()?;
        if !catalog.contains(table) {
            return Err(PrimDbError::TableNotFound(table.to_string()));
        }
        self.storage.load(table)
    }

    /// Like [`select_rows`](Self::select_rows), served from the read cache
    /// when the table has not been written to since the last read.
    pub fn select_with_cache(&mut self, table: &str) -> Result<Selection> {
        if let Some(rows) = self.cache.lookup(table) {
            return Ok(Selection {
                rows: rows.clone(),
                from_cache: true,
            });
        }

        let rows = self.select_rows(table)?;
        self.cache.store(table, rows.clone());
        Ok(Selection {
            rows,
            from_cache: false,
        })
    }

    /// Overwrite the named fields of the row with `id`. Other fields and rows
    /// are left as they are.
    pub fn update_row_by_id(&mut self, table: &str, id: u64, new_values: &FieldValues) -> Result<()> {
        let catalog = self.meta.load()?;
        let schema = catalog
            .get(table)
            .ok_or_else(|| PrimDbError::TableNotFound(table.to_string()))?;

        let mut rows = self.storage.load(table)?;
        let table_empty = rows.is_empty();
        let target = rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| PrimDbError::RowNotFound {
                table: table.to_string(),
                id,
                table_empty,
            })?;

        let coerced = validation::coerce_values(table, schema, new_values)?;
        for (field, value) in coerced {
            target.insert(field, value);
        }

        self.storage.persist(table, &rows)?;
        self.cache.invalidate(table);

        log::debug!("Updated row id={id} in '{table}'");
        Ok(())
    }

    /// Delete the row with `id`.
    pub fn delete_row_by_id(&mut self, table: &str, id: u64) -> Result<()> {
        let catalog = self.meta.load()?;
        if !catalog.contains(table) {
            return Err(PrimDbError::TableNotFound(table.to_string()));
        }

        let rows = self.storage.load(table)?;
        let before = rows.len();
        let remaining: Vec<Row> = rows
            .into_iter()
            .filter(|row| row_id(row) != Some(id))
            .collect();

        if remaining.len() == before {
            return Err(PrimDbError::RowNotFound {
                table: table.to_string(),
                id,
                table_empty: before == 0,
            });
        }

        self.storage.persist(table, &remaining)?;
        self.cache.invalidate(table);

        log::debug!("Deleted row id={id} from '{table}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriteMode;
    use crate::schema::ColumnType;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_db() -> (TempDir, Database) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DbConfig::new(tmp.path())).unwrap();
        (tmp, db)
    }

    fn cols(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn values(v: serde_json::Value) -> FieldValues {
        serde_json::from_value(v).unwrap()
    }

    fn create_users(db: &mut Database) {
        db.create_table("users", &cols(&[("name", "str"), ("age", "int")]))
            .unwrap();
    }

    #[test]
    fn test_open_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let db = Database::open(DbConfig::new(&dir)).unwrap();
        assert!(dir.is_dir());
        assert!(db.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_create_table_prepends_id() {
        let (_tmp, mut db) = setup_test_db();
        for (table, columns) in [
            ("a", cols(&[("x", "int")])),
            ("b", cols(&[("x", "string"), ("y", "int"), ("z", "str")])),
            ("c", cols(&[])),
        ] {
            db.create_table(table, &columns).unwrap();
            let listed = db.list_tables().unwrap();
            let schema = listed.get(table).unwrap();
            let names: Vec<&str> = schema.columns.keys().map(String::as_str).collect();
            let mut expected = vec!["id"];
            expected.extend(columns.keys().map(String::as_str));
            assert_eq!(names, expected);
            assert_eq!(schema.column_type("id"), Some(ColumnType::Int));
            assert_eq!(schema.next_id, 1);
        }
    }

    #[test]
    fn test_create_table_twice_fails() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        let err = db
            .create_table("users", &cols(&[("name", "str")]))
            .unwrap_err();
        assert!(matches!(err, PrimDbError::TableAlreadyExists(ref t) if t == "users"));
    }

    #[test]
    fn test_create_table_unsupported_type() {
        let (_tmp, mut db) = setup_test_db();
        let err = db
            .create_table("t", &cols(&[("score", "float")]))
            .unwrap_err();
        assert!(matches!(err, PrimDbError::UnsupportedColumnType { .. }));
        assert!(db.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_create_table_rejects_path_like_names() {
        let (_tmp, mut db) = setup_test_db();
        let err = db.create_table("../evil", &cols(&[("a", "int")])).unwrap_err();
        assert!(matches!(err, PrimDbError::InvalidName { .. }));
    }

    #[test]
    fn test_create_table_cannot_shadow_metadata_file() {
        let (tmp, mut db) = setup_test_db();
        create_users(&mut db);

        let err = db.create_table("db_meta", &cols(&[("a", "int")])).unwrap_err();
        assert!(matches!(err, PrimDbError::ReservedTableName(ref t) if t == "db_meta"));

        assert!(db.list_tables().unwrap().contains("users"));
        assert!(!db.list_tables().unwrap().contains("db_meta"));
        assert!(db.select_rows("users").unwrap().is_empty());
        let raw = std::fs::read_to_string(tmp.path().join("db_meta.json")).unwrap();
        assert!(raw.contains("users"));
    }

    #[test]
    fn test_custom_meta_file_name_is_reserved() {
        let tmp = TempDir::new().unwrap();
        let mut config = DbConfig::new(tmp.path());
        config.meta_file = "catalog.json".to_string();
        let mut db = Database::open(config).unwrap();

        let err = db.create_table("catalog", &cols(&[("a", "int")])).unwrap_err();
        assert!(matches!(err, PrimDbError::ReservedTableName(_)));
        db.create_table("db_meta", &cols(&[("a", "int")])).unwrap();
        assert!(db.list_tables().unwrap().contains("db_meta"));
    }

    #[test]
    fn test_create_table_writes_empty_file() {
        let (tmp, mut db) = setup_test_db();
        create_users(&mut db);
        let raw = std::fs::read_to_string(tmp.path().join("users.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!([]));
    }

    #[test]
    fn test_metadata_layout() {
        let (tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.insert_row("users", &values(json!({"name": "Ann"}))).unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("db_meta.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            json!({
                "users": {
                    "columns": { "id": "int", "name": "string", "age": "int" },
                    "next_id": 2
                }
            })
        );
    }

    #[test]
    fn test_insert_coerces_and_fills_nulls() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        let id = db.insert_row("users", &values(json!({"age": "30"}))).unwrap();
        assert_eq!(id, 1);

        let rows = db.select_rows("users").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            serde_json::to_value(&rows[0]).unwrap(),
            json!({"id": 1, "name": null, "age": 30})
        );
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "age"]);
    }

    #[test]
    fn test_insert_ids_are_per_table_and_monotonic() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.create_table("posts", &cols(&[("title", "str")])).unwrap();

        let a1 = db.insert_row("users", &values(json!({"name": "A"}))).unwrap();
        let p1 = db.insert_row("posts", &values(json!({"title": "T"}))).unwrap();
        let a2 = db.insert_row("users", &values(json!({"name": "B"}))).unwrap();
        db.delete_row_by_id("users", a2).unwrap();
        let a3 = db.insert_row("users", &values(json!({"name": "C"}))).unwrap();

        assert_eq!((a1, a2, a3), (1, 2, 3));
        assert_eq!(p1, 1);
    }

    #[test]
    fn test_insert_errors() {
        let (_tmp, mut db) = setup_test_db();
        let err = db.insert_row("ghost", &values(json!({"a": 1}))).unwrap_err();
        assert!(matches!(err, PrimDbError::TableNotFound(_)));

        create_users(&mut db);
        let err = db.insert_row("users", &values(json!({"email": "x"}))).unwrap_err();
        assert!(matches!(err, PrimDbError::FieldNotFound { .. }));
        let err = db.insert_row("users", &values(json!({"id": 9}))).unwrap_err();
        assert!(matches!(err, PrimDbError::FieldNotFound { .. }));
        let err = db.insert_row("users", &values(json!({"age": "old"}))).unwrap_err();
        assert!(matches!(err, PrimDbError::TypeCoercionFailure { .. }));

        // failed inserts neither add rows nor consume ids
        assert!(db.select_rows("users").unwrap().is_empty());
        assert_eq!(db.describe_table("users").unwrap().next_id, 1);
    }

    #[test]
    fn test_update_changes_only_named_fields() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.insert_row("users", &values(json!({"name": "Ann", "age": "30"}))).unwrap();
        db.insert_row("users", &values(json!({"name": "Bob", "age": "40"}))).unwrap();

        db.update_row_by_id("users", 1, &values(json!({"age": "31"}))).unwrap();

        let rows = db.select_rows("users").unwrap();
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([
                {"id": 1, "name": "Ann", "age": 31},
                {"id": 2, "name": "Bob", "age": 40}
            ])
        );
    }

    #[test]
    fn test_update_errors() {
        let (_tmp, mut db) = setup_test_db();
        let err = db.update_row_by_id("ghost", 1, &values(json!({}))).unwrap_err();
        assert!(matches!(err, PrimDbError::TableNotFound(_)));

        create_users(&mut db);
        let empty = db.update_row_by_id("users", 1, &values(json!({"age": 1}))).unwrap_err();
        assert!(matches!(empty, PrimDbError::RowNotFound { table_empty: true, .. }));

        db.insert_row("users", &values(json!({"name": "Ann"}))).unwrap();
        let missing = db.update_row_by_id("users", 5, &values(json!({"age": 1}))).unwrap_err();
        assert!(matches!(missing, PrimDbError::RowNotFound { id: 5, table_empty: false, .. }));
        assert_ne!(empty.to_string(), missing.to_string());

        let err = db.update_row_by_id("users", 1, &values(json!({"id": 2}))).unwrap_err();
        assert!(matches!(err, PrimDbError::FieldNotFound { .. }));
        let err = db.update_row_by_id("users", 1, &values(json!({"age": "x"}))).unwrap_err();
        assert!(matches!(err, PrimDbError::TypeCoercionFailure { .. }));

        // the row is untouched after failed updates
        let rows = db.select_rows("users").unwrap();
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([{"id": 1, "name": "Ann", "age": null}])
        );
    }

    #[test]
    fn test_delete_row() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        for name in ["A", "B", "C"] {
            db.insert_row("users", &values(json!({ "name": name }))).unwrap();
        }

        db.delete_row_by_id("users", 2).unwrap();
        let ids: Vec<u64> = db
            .select_rows("users")
            .unwrap()
            .iter()
            .filter_map(row_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        let err = db.delete_row_by_id("users", 2).unwrap_err();
        assert!(matches!(err, PrimDbError::RowNotFound { id: 2, .. }));
        let err = db.delete_row_by_id("ghost", 1).unwrap_err();
        assert!(matches!(err, PrimDbError::TableNotFound(_)));
    }

    #[test]
    fn test_drop_table_truncates_but_keeps_file() {
        let (tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.insert_row("users", &values(json!({"name": "Ann"}))).unwrap();

        db.drop_table("users").unwrap();

        assert!(!db.list_tables().unwrap().contains("users"));
        let path = tmp.path().join("users.json");
        assert!(path.exists());
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, json!([]));

        assert!(matches!(
            db.select_rows("users"),
            Err(PrimDbError::TableNotFound(_))
        ));
        assert!(matches!(
            db.drop_table("users"),
            Err(PrimDbError::TableNotFound(_))
        ));

        // the name can be reused, ids start over
        create_users(&mut db);
        assert_eq!(db.insert_row("users", &values(json!({}))).unwrap(), 1);
    }

    #[test]
    fn test_describe_table() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        let schema = db.describe_table("users").unwrap();
        assert_eq!(schema.column_type("age"), Some(ColumnType::Int));
        assert!(matches!(
            db.describe_table("ghost"),
            Err(PrimDbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_cache_hit_miss_sequence() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.create_table("posts", &cols(&[("title", "str")])).unwrap();

        assert!(!db.select_with_cache("users").unwrap().from_cache);
        assert!(db.select_with_cache("users").unwrap().from_cache);
        assert!(db.select_with_cache("users").unwrap().from_cache);

        // writes to another table leave this entry alone
        assert!(!db.select_with_cache("posts").unwrap().from_cache);
        db.insert_row("posts", &values(json!({"title": "T"}))).unwrap();
        assert!(db.select_with_cache("users").unwrap().from_cache);

        db.insert_row("users", &values(json!({"name": "Ann"}))).unwrap();
        let sel = db.select_with_cache("users").unwrap();
        assert!(!sel.from_cache);
        assert_eq!(sel.rows.len(), 1);
        assert!(db.select_with_cache("users").unwrap().from_cache);

        db.update_row_by_id("users", 1, &values(json!({"age": 5}))).unwrap();
        assert!(!db.select_with_cache("users").unwrap().from_cache);

        db.delete_row_by_id("users", 1).unwrap();
        let sel = db.select_with_cache("users").unwrap();
        assert!(!sel.from_cache);
        assert!(sel.rows.is_empty());

        db.drop_table("users").unwrap();
        assert!(matches!(
            db.select_with_cache("users"),
            Err(PrimDbError::TableNotFound(_))
        ));
        create_users(&mut db);
        assert!(!db.select_with_cache("users").unwrap().from_cache);
    }

    #[test]
    fn test_cached_rows_match_disk() {
        let (_tmp, mut db) = setup_test_db();
        create_users(&mut db);
        db.insert_row("users", &values(json!({"name": "Ann", "age": 3}))).unwrap();
        let first = db.select_with_cache("users").unwrap();
        let second = db.select_with_cache("users").unwrap();
        assert_eq!(first.rows, second.rows);
        assert_eq!(second.rows, db.select_rows("users").unwrap());
        assert_eq!(db.cache().stats().hits, 1);
    }

    #[test]
    fn test_sessions_do_not_share_cache() {
        let tmp = TempDir::new().unwrap();
        let mut a = Database::open(DbConfig::new(tmp.path())).unwrap();
        let mut b = Database::open(DbConfig::new(tmp.path())).unwrap();
        create_users(&mut a);

        assert!(!a.select_with_cache("users").unwrap().from_cache);
        assert!(!b.select_with_cache("users").unwrap().from_cache);
        assert!(a.select_with_cache("users").unwrap().from_cache);
    }

    #[test]
    fn test_reopen_sees_persisted_state() {
        let tmp = TempDir::new().unwrap();
        {
            let mut db = Database::open(DbConfig::new(tmp.path())).unwrap();
            create_users(&mut db);
            db.insert_row("users", &values(json!({"name": "Ann"}))).unwrap();
        }
        let mut db = Database::open(DbConfig::new(tmp.path())).unwrap();
        assert_eq!(db.select_rows("users").unwrap().len(), 1);
        assert_eq!(db.insert_row("users", &values(json!({}))).unwrap(), 2);
    }

    #[test]
    fn test_overwrite_mode_behaves_the_same() {
        let tmp = TempDir::new().unwrap();
        let config = DbConfig::new(tmp.path()).with_write_mode(WriteMode::Overwrite);
        let mut db = Database::open(config).unwrap();
        create_users(&mut db);
        db.insert_row("users", &values(json!({"name": "Ann", "age": "7"}))).unwrap();
        db.update_row_by_id("users", 1, &values(json!({"name": "Anna"}))).unwrap();
        assert_eq!(
            serde_json::to_value(db.select_rows("users").unwrap()).unwrap(),
            json!([{"id": 1, "name": "Anna", "age": 7}])
        );
    }
}

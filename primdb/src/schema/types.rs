use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the implicit auto-increment column every table starts with.
pub const ID_COLUMN: &str = "id";

/// A stored record: column name -> value, in schema column order.
pub type Row = IndexMap<String, serde_json::Value>;

/// Raw field values supplied by a caller for insert or update.
pub type FieldValues = IndexMap<String, serde_json::Value>;

/// Column type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    #[serde(alias = "str")]
    String,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single table plus its id counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: IndexMap<String, ColumnType>,
    pub next_id: u64,
}

impl TableSchema {
    /// Build a fresh schema. The `id` column is always placed first and
    /// the counter starts at 1.
    pub fn new<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (String, ColumnType)>,
    {
        let mut all = IndexMap::new();
        all.insert(ID_COLUMN.to_string(), ColumnType::Int);
        for (name, ty) in columns {
            if name != ID_COLUMN {
                all.insert(name, ty);
            }
        }
        TableSchema {
            columns: all,
            next_id: 1,
        }
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// Declared columns, without the implicit `id`.
    pub fn data_columns(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns
            .iter()
            .filter(|(name, _)| name.as_str() != ID_COLUMN)
            .map(|(name, ty)| (name.as_str(), *ty))
    }
}

/// Every table's schema, keyed by table name. Serialized as a plain object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub tables: IndexMap<String, TableSchema>,
}

impl Catalog {
    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }

    pub fn get_mut(&mut self, table: &str) -> Option<&mut TableSchema> {
        self.tables.get_mut(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn insert(&mut self, table: String, schema: TableSchema) {
        self.tables.insert(table, schema);
    }

    pub fn remove(&mut self, table: &str) -> Option<TableSchema> {
        self.tables.shift_remove(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TableSchema)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The `id` of a stored row, if it holds a non-negative integer.
pub fn row_id(row: &Row) -> Option<u64> {
    row.get(ID_COLUMN).and_then(serde_json::Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_schema_prepends_id() {
        let schema = TableSchema::new(vec![
            ("name".to_string(), ColumnType::String),
            ("age".to_string(), ColumnType::Int),
        ]);
        let names: Vec<&str> = schema.columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(schema.next_id, 1);
        assert_eq!(schema.column_type("id"), Some(ColumnType::Int));
    }

    #[test]
    fn test_data_columns_skip_id() {
        let schema = TableSchema::new(vec![("age".to_string(), ColumnType::Int)]);
        let data: Vec<_> = schema.data_columns().collect();
        assert_eq!(data, vec![("age", ColumnType::Int)]);
    }

    #[test]
    fn test_catalog_json_layout() {
        let mut catalog = Catalog::default();
        catalog.insert(
            "users".into(),
            TableSchema::new(vec![("name".to_string(), ColumnType::String)]),
        );
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "users": { "columns": { "id": "int", "name": "string" }, "next_id": 1 }
            })
        );
    }

    #[test]
    fn test_str_alias_deserializes() {
        let schema: TableSchema =
            serde_json::from_str(r#"{"columns": {"id": "int", "name": "str"}, "next_id": 4}"#)
                .unwrap();
        assert_eq!(schema.column_type("name"), Some(ColumnType::String));
        assert_eq!(schema.next_id, 4);
    }

    #[test]
    fn test_row_id() {
        let mut row = Row::new();
        assert_eq!(row_id(&row), None);
        row.insert("id".into(), serde_json::json!(7));
        assert_eq!(row_id(&row), Some(7));
    }
}

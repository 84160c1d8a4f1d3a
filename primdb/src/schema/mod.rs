mod parser;
mod types;

pub use parser::{parse_column_type, parse_columns, validate_name};
pub use types::{row_id, Catalog, ColumnType, FieldValues, Row, TableSchema, ID_COLUMN};

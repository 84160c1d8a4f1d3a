use crate::command::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimDbError {
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Type '{ty}' of column '{column}' is not supported (expected int or string)")]
    UnsupportedColumnType { column: String, ty: String },

    #[error("Column 'id' is reserved and always has type int (got '{ty}')")]
    ReservedColumn { ty: String },

    #[error("Invalid {kind} name '{name}': use letters, digits and '_', not starting with a digit")]
    InvalidName { kind: &'static str, name: String },

    #[error("Table name '{0}' is taken by the metadata document")]
    ReservedTableName(String),

    #[error("Field '{field}' does not exist in table '{table}'")]
    FieldNotFound { table: String, field: String },

    #[error("{}", missing_row_message(.table, *.id, *.table_empty))]
    RowNotFound {
        table: String,
        id: u64,
        table_empty: bool,
    },

    #[error("Cannot convert '{value}' to {expected} for field '{field}'")]
    TypeCoercionFailure {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    ConditionNotById(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn missing_row_message(table: &str, id: u64, table_empty: bool) -> String {
    if table_empty {
        format!("Table '{table}' has no rows")
    } else {
        format!("Row with id={id} not found in table '{table}'")
    }
}

pub type Result<T> = std::result::Result<T, PrimDbError>;

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod meta;
pub mod schema;
pub mod storage;
pub mod store;
pub mod validation;

pub use command::{parse_command, Command, Condition, ParseError};
pub use config::{DbConfig, WriteMode};
pub use error::{PrimDbError, Result};
pub use schema::{Catalog, ColumnType, FieldValues, Row, TableSchema};
pub use store::{Database, Selection};

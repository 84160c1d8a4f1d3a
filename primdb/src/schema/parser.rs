use super::types::{ColumnType, ID_COLUMN};
use crate::error::{PrimDbError, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"))
}

/// Check that a table or column name is a plain identifier.
/// Table names become file names, so anything path-like is refused.
pub fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(PrimDbError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Parse a declared column type (`int`, `string` or `str`).
pub fn parse_column_type(column: &str, ty: &str) -> Result<ColumnType> {
    match ty.to_ascii_lowercase().as_str() {
        "int" => Ok(ColumnType::Int),
        "string" | "str" => Ok(ColumnType::String),
        _ => Err(PrimDbError::UnsupportedColumnType {
            column: column.to_string(),
            ty: ty.to_string(),
        }),
    }
}

/// Turn raw `name -> type` declarations into typed columns.
/// A redundant `id:int` is dropped; `id` with any other type is refused.
pub fn parse_columns(columns: &IndexMap<String, String>) -> Result<Vec<(String, ColumnType)>> {
    let mut parsed = Vec::with_capacity(columns.len());
    for (name, ty) in columns {
        validate_name("column", name)?;
        let column_type = parse_column_type(name, ty)?;
        if name == ID_COLUMN {
            if column_type != ColumnType::Int {
                return Err(PrimDbError::ReservedColumn { ty: ty.clone() });
            }
            log::warn!("Ignoring explicit '{ID_COLUMN}:{ty}' column: it is always implicit");
            continue;
        }
        parsed.push((name.clone(), column_type));
    }
    Ok(parsed)
}

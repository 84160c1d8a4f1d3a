use crate::error::{PrimDbError, Result};
use crate::schema::{ColumnType, FieldValues, TableSchema, ID_COLUMN};
use serde_json::Value;

/// Check every supplied field against the table schema and coerce it to the
/// declared column type. Nothing is returned unless all fields pass.
pub fn coerce_values(table: &str, schema: &TableSchema, values: &FieldValues) -> Result<FieldValues> {
    let mut coerced = FieldValues::with_capacity(values.len());

    for (field, value) in values {
        let column_type = match schema.column_type(field) {
            Some(ty) if field != ID_COLUMN => ty,
            _ => {
                return Err(PrimDbError::FieldNotFound {
                    table: table.to_string(),
                    field: field.clone(),
                })
            }
        };
        coerced.insert(field.clone(), coerce_value(field, column_type, value)?);
    }

    Ok(coerced)
}

/// Convert one raw value to `column_type`.
///
/// `int` accepts JSON integers and strings holding an integer (surrounding
/// whitespace and a sign are allowed). `string` accepts anything and
/// stringifies non-string values. `null` stays `null` for both.
pub fn coerce_value(field: &str, column_type: ColumnType, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match column_type {
        ColumnType::Int => {
            let parsed = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed.map(Value::from).ok_or_else(|| PrimDbError::TypeCoercionFailure {
                field: field.to_string(),
                value: display_value(value),
                expected: "int",
            })
        }
        ColumnType::String => Ok(Value::String(display_value(value))),
    }
}

/// Text form of a stored value: strings without quotes, `null` for null,
/// JSON text for everything else.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

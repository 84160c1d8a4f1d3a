//! The command language: one line of whitespace-separated tokens.
//!
//! ```text
//! help | list (ls) | exit (q)
//! describe <table>
//! create <table> <col>:<type> ...
//! insert <table> <field>=<value> ...
//! select <table> [where <field>=<value>]
//! update <table> set <field>=<value> ... where <field>=<value>
//! delete <table> where <field>=<value>
//! drop <table>
//! ```

use crate::error::{PrimDbError, Result};
use crate::schema::{FieldValues, Row, ID_COLUMN};
use crate::validation::display_value;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A fully parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Exit,
    Describe {
        table: String,
    },
    Create {
        table: String,
        columns: IndexMap<String, String>,
    },
    Insert {
        table: String,
        values: IndexMap<String, String>,
    },
    Select {
        table: String,
        filter: Option<Condition>,
    },
    Update {
        table: String,
        values: IndexMap<String, String>,
        condition: Condition,
    },
    Delete {
        table: String,
        condition: Condition,
    },
    Drop {
        table: String,
    },
}

impl Command {
    /// Canonical keyword of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::List => "list",
            Command::Exit => "exit",
            Command::Describe { .. } => "describe",
            Command::Create { .. } => "create",
            Command::Insert { .. } => "insert",
            Command::Select { .. } => "select",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Drop { .. } => "drop",
        }
    }

    /// Table the command operates on, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Command::Help | Command::List | Command::Exit => None,
            Command::Describe { table }
            | Command::Create { table, .. }
            | Command::Insert { table, .. }
            | Command::Select { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. }
            | Command::Drop { table } => Some(table),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_command(s)
    }
}

/// A single `field=value` equality condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the row's field, rendered as text, equals the condition value.
    /// A row without the field never matches.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.field)
            .map(|v| display_value(v) == self.value)
            .unwrap_or(false)
    }

    /// The row id targeted by an `id=<n>` condition.
    pub fn row_id(&self) -> Result<u64> {
        if self.field != ID_COLUMN {
            return Err(PrimDbError::ConditionNotById(format!(
                "Condition must be of the form id=<number>, got '{self}'"
            )));
        }
        self.value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                PrimDbError::ConditionNotById(format!(
                    "Row id must be a positive integer, got '{}'",
                    self.value
                ))
            })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// A violated grammar rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("expected a table name after '{0}'")]
    MissingTable(&'static str),

    #[error("create needs at least one column as name:type")]
    MissingColumns,

    #[error("expected column as name:type, got '{0}'")]
    MalformedColumn(String),

    #[error("{0} needs at least one field as name=value")]
    MissingValues(&'static str),

    #[error("expected field as name=value, got '{0}'")]
    MalformedAssignment(String),

    #[error("expected keyword '{0}'")]
    MissingKeyword(&'static str),

    #[error("expected a condition field=value after 'where'")]
    MissingCondition,

    #[error("invalid condition after 'where': '{0}'")]
    MalformedCondition(String),

    #[error("'set' must be followed by at least one field=value before 'where'")]
    EmptySetClause,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
}

/// Parsed `name=value` pairs as raw field values for insert/update.
pub fn to_field_values(values: &IndexMap<String, String>) -> FieldValues {
    values
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect()
}

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse one line of input into a [`Command`].
pub fn parse_command(line: &str) -> ParseResult<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Err(ParseError::Empty);
    };

    let keyword = first.to_lowercase();
    let keyword = match keyword.as_str() {
        "ls" => "list",
        "q" => "exit",
        other => other,
    };

    match keyword {
        "help" => Ok(Command::Help),
        "list" => Ok(Command::List),
        "exit" => Ok(Command::Exit),
        "describe" => {
            let table = table_name(&tokens, "describe")?;
            no_more_tokens(&tokens[2..])?;
            Ok(Command::Describe { table })
        }
        "create" => {
            let table = table_name(&tokens, "create")?;
            let columns = parse_columns(&tokens[2..])?;
            Ok(Command::Create { table, columns })
        }
        "insert" => {
            let table = table_name(&tokens, "insert")?;
            if tokens.len() == 2 {
                return Err(ParseError::MissingValues("insert"));
            }
            let values = parse_assignments(&tokens[2..])?;
            Ok(Command::Insert { table, values })
        }
        "select" => {
            let table = table_name(&tokens, "select")?;
            let rest = &tokens[2..];
            let filter = match rest.first() {
                None => None,
                Some(token) if is_keyword(token, "where") => Some(parse_where(&rest[1..])?),
                Some(token) => return Err(ParseError::UnexpectedToken(token.to_string())),
            };
            Ok(Command::Select { table, filter })
        }
        "update" => {
            let table = table_name(&tokens, "update")?;
            let rest = &tokens[2..];
            let where_at = find_keyword(rest, "where").ok_or(ParseError::MissingKeyword("where"))?;

            // `set` has to come before `where`
            let head = &rest[..where_at];
            let set_at = find_keyword(head, "set").ok_or(ParseError::MissingKeyword("set"))?;
            no_more_tokens(&head[..set_at])?;
            let assignments = &head[set_at + 1..];
            if assignments.is_empty() {
                return Err(ParseError::EmptySetClause);
            }
            let values = parse_assignments(assignments)?;
            let condition = parse_where(&rest[where_at + 1..])?;
            Ok(Command::Update {
                table,
                values,
                condition,
            })
        }
        "delete" => {
            let table = table_name(&tokens, "delete")?;
            let rest = &tokens[2..];
            let where_at = find_keyword(rest, "where").ok_or(ParseError::MissingKeyword("where"))?;
            no_more_tokens(&rest[..where_at])?;
            let condition = parse_where(&rest[where_at + 1..])?;
            Ok(Command::Delete { table, condition })
        }
        "drop" => {
            let table = table_name(&tokens, "drop")?;
            no_more_tokens(&tokens[2..])?;
            Ok(Command::Drop { table })
        }
        _ => Err(ParseError::UnknownCommand(first.to_string())),
    }
}

fn table_name(tokens: &[&str], command: &'static str) -> ParseResult<String> {
    tokens
        .get(1)
        .map(|t| t.to_string())
        .ok_or(ParseError::MissingTable(command))
}

fn is_keyword(token: &str, keyword: &str) -> bool {
    token.eq_ignore_ascii_case(keyword)
}

fn find_keyword(tokens: &[&str], keyword: &str) -> Option<usize> {
    tokens.iter().position(|t| is_keyword(t, keyword))
}

fn no_more_tokens(tokens: &[&str]) -> ParseResult<()> {
    match tokens.first() {
        Some(token) => Err(ParseError::UnexpectedToken(token.to_string())),
        None => Ok(()),
    }
}

fn parse_columns(tokens: &[&str]) -> ParseResult<IndexMap<String, String>> {
    if tokens.is_empty() {
        return Err(ParseError::MissingColumns);
    }
    let mut columns = IndexMap::new();
    for token in tokens {
        match token.split_once(':') {
            Some((name, ty)) if !name.is_empty() && !ty.is_empty() => {
                columns.insert(name.to_string(), ty.to_string());
            }
            _ => return Err(ParseError::MalformedColumn(token.to_string())),
        }
    }
    Ok(columns)
}

fn parse_assignments(tokens: &[&str]) -> ParseResult<IndexMap<String, String>> {
    let mut values = IndexMap::new();
    for token in tokens {
        match token.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                values.insert(name.to_string(), value.to_string());
            }
            _ => return Err(ParseError::MalformedAssignment(token.to_string())),
        }
    }
    Ok(values)
}

/// Parse what follows `where`: exactly one `field=value` token.
fn parse_where(tokens: &[&str]) -> ParseResult<Condition> {
    let token = tokens.first().ok_or(ParseError::MissingCondition)?;
    let condition = match token.split_once('=') {
        Some((field, value)) if !field.is_empty() => Condition::new(field, value),
        _ => return Err(ParseError::MalformedCondition(token.to_string())),
    };
    no_more_tokens(&tokens[1..])?;
    Ok(condition)
}

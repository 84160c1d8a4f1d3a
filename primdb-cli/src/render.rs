use clap::ValueEnum;
use comfy_table::{presets, Cell, ContentArrangement, Table};
use primdb::validation::display_value;
use primdb::{Catalog, Row, TableSchema};
use serde::Serialize;
use std::io;

pub const HELP: &str = "\
Commands:
  help                                  Show this help
  list                                  List tables
  describe <table>                      Show column names and types
  create <table> <col>:<type> ...       Create a table (types: int, string/str)
      e.g. create users name:str age:int
  insert <table> <field>=<value> ...    Add a row
      e.g. insert users name=Alice age=30
  select <table> [where <field>=<value>]
                                        Show rows (served from cache when unchanged)
      e.g. select users where age=30
  update <table> set <field>=<value> ... where id=<n>
                                        Change fields of one row
      e.g. update users set age=31 where id=1
  delete <table> where id=<n>           Delete one row (asks for confirmation)
  drop <table>                          Drop a table (asks for confirmation)
  exit                                  Quit
Aliases:
  ls -> list
  q  -> exit
";

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> io::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(io::Error::other),
        OutputFormat::Yaml | OutputFormat::Table => {
            serde_yaml::to_string(value).map_err(io::Error::other)
        }
    }
}

/// Render selected rows. Table output takes its header from the first row.
pub fn rows(rows: &[Row], format: OutputFormat) -> io::Result<String> {
    if format != OutputFormat::Table {
        return serialize(&rows, format);
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    if let Some(first) = rows.first() {
        table.set_header(first.keys().map(Cell::new));
        for row in rows {
            table.add_row(first.keys().map(|column| {
                Cell::new(row.get(column).map(display_value).unwrap_or_default())
            }));
        }
    }

    Ok(format!("{table}\n"))
}

/// Render the table list.
pub fn catalog(catalog: &Catalog, format: OutputFormat) -> io::Result<String> {
    if format != OutputFormat::Table {
        return serialize(catalog, format);
    }
    if catalog.is_empty() {
        return Ok("No tables yet.\n".to_string());
    }

    let mut out = String::new();
    for (name, schema) in catalog.iter() {
        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|(column, ty)| format!("{column} ({ty})"))
            .collect();
        out.push_str(&format!("- {name}: {}\n", columns.join(", ")));
    }
    Ok(out)
}

/// Render one table's schema.
pub fn schema(name: &str, schema: &TableSchema, format: OutputFormat) -> io::Result<String> {
    if format != OutputFormat::Table {
        return serialize(schema, format);
    }

    let mut out = format!("Table '{name}' (next id: {}):\n", schema.next_id);
    for (column, ty) in &schema.columns {
        out.push_str(&format!("  {column}: {ty}\n"));
    }
    Ok(out)
}

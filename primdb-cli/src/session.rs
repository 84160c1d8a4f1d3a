use crate::middleware::{confirm_then, timed, Confirm};
use crate::render::{self, OutputFormat};
use primdb::command::to_field_values;
use primdb::{parse_command, Command, Database};
use std::io::Write;

/// What the caller should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One shell session: a database handle plus presentation settings.
pub struct Session {
    db: Database,
    format: OutputFormat,
    timing: bool,
    confirm: Box<dyn Confirm>,
}

impl Session {
    pub fn new(db: Database, format: OutputFormat, timing: bool, confirm: Box<dyn Confirm>) -> Self {
        Session {
            db,
            format,
            timing,
            confirm,
        }
    }

    /// Parse and run one line of input.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> primdb::Result<Flow> {
        let command = parse_command(line)?;
        match command.table() {
            Some(table) => log::debug!("Running '{}' on table '{table}'", command.name()),
            None => log::debug!("Running '{}'", command.name()),
        }
        self.dispatch(command, out)
    }

    pub fn dispatch(&mut self, command: Command, out: &mut dyn Write) -> primdb::Result<Flow> {
        match command {
            Command::Help => write!(out, "{}", render::HELP)?,

            Command::Exit => return Ok(Flow::Exit),

            Command::List => {
                let catalog = self.db.list_tables()?;
                write!(out, "{}", render::catalog(&catalog, self.format)?)?;
            }

            Command::Describe { table } => {
                let schema = self.db.describe_table(&table)?;
                write!(out, "{}", render::schema(&table, &schema, self.format)?)?;
            }

            Command::Create { table, columns } => {
                let schema = self.db.create_table(&table, &columns)?;
                let columns: Vec<String> = schema
                    .columns
                    .iter()
                    .map(|(column, ty)| format!("{column}:{ty}"))
                    .collect();
                writeln!(out, "Table '{table}' created ({}).", columns.join(", "))?;
            }

            Command::Insert { table, values } => {
                let id = self.db.insert_row(&table, &to_field_values(&values))?;
                writeln!(out, "Row id={id} added to table '{table}'.")?;
            }

            Command::Select { table, filter } => {
                let db = &mut self.db;
                let (selection, elapsed) = timed("select", || db.select_with_cache(&table));
                let selection = selection?;

                let rows: Vec<_> = match &filter {
                    Some(condition) => selection
                        .rows
                        .into_iter()
                        .filter(|row| condition.matches(row))
                        .collect(),
                    None => selection.rows,
                };

                if self.format != OutputFormat::Table {
                    write!(out, "{}", render::rows(&rows, self.format)?)?;
                } else if rows.is_empty() {
                    writeln!(out, "No matching rows in table '{table}'.")?;
                } else {
                    write!(out, "{}", render::rows(&rows, self.format)?)?;
                    let source = if selection.from_cache { "cache" } else { "disk" };
                    writeln!(out, "[rows read from {source}]")?;
                }
                if self.timing {
                    writeln!(out, "select took {:.4}s", elapsed.as_secs_f64())?;
                }
            }

            Command::Update {
                table,
                values,
                condition,
            } => {
                let id = condition.row_id()?;
                self.db.update_row_by_id(&table, id, &to_field_values(&values))?;
                writeln!(out, "Row id={id} in table '{table}' updated.")?;
            }

            Command::Delete { table, condition } => {
                let id = condition.row_id()?;
                let db = &mut self.db;
                let prompt = format!("Delete row id={id} from '{table}'? (y/n): ");
                match confirm_then(self.confirm.as_mut(), &prompt, || db.delete_row_by_id(&table, id))? {
                    Some(()) => writeln!(out, "Row id={id} deleted from table '{table}'.")?,
                    None => writeln!(out, "Cancelled.")?,
                }
            }

            Command::Drop { table } => {
                let db = &mut self.db;
                let prompt = format!("Drop table '{table}' and all its rows? (y/n): ");
                match confirm_then(self.confirm.as_mut(), &prompt, || db.drop_table(&table))? {
                    Some(()) => writeln!(out, "Table '{table}' dropped.")?,
                    None => writeln!(out, "Cancelled.")?,
                }
            }
        }

        Ok(Flow::Continue)
    }
}

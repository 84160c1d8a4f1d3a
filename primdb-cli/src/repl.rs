//! Interactive prompt with line editing and history.

use crate::middleware::report_error;
use crate::session::{Flow, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;
use std::path::Path;

const PROMPT: &str = "primdb> ";

pub fn run(session: &mut Session, history: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut editor = DefaultEditor::new()?;
    if let Some(path) = history {
        if let Err(e) = editor.load_history(path) {
            log::debug!("No history loaded from {}: {e}", path.display());
        }
    }

    println!("Type 'help' for the list of commands.");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;

        let mut stdout = io::stdout();
        match session.execute_line(line, &mut stdout) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => report_error(&mut stdout, &e)?,
        }
    }

    if let Some(path) = history {
        editor.save_history(path)?;
    }
    println!("Bye.");
    Ok(())
}

//! Wrappers the shell puts around engine calls: confirmation before
//! destructive commands, timing, and error reporting.

use primdb::PrimDbError;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

/// Source of answers to yes/no questions.
pub trait Confirm {
    /// Show `prompt` and return the raw answer.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;
}

/// Answers yes to everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn ask(&mut self, _prompt: &str) -> io::Result<String> {
        Ok("y".to_string())
    }
}

/// Reads the answer from stdin.
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer)
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "д" | "да"
    )
}

/// Ask before running `action`. Returns `None` when the user declines.
pub fn confirm_then<T>(
    confirm: &mut dyn Confirm,
    prompt: &str,
    action: impl FnOnce() -> primdb::Result<T>,
) -> primdb::Result<Option<T>> {
    let answer = confirm.ask(prompt)?;
    if !is_affirmative(&answer) {
        log::debug!("Declined: {prompt}");
        return Ok(None);
    }
    action().map(Some)
}

/// Run `f` and measure how long it took.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    log::info!("{label} finished in {:.4}s", elapsed.as_secs_f64());
    (result, elapsed)
}

/// Print an error for the user. Parse errors get a pointer to `help`.
pub fn report_error(out: &mut dyn Write, err: &PrimDbError) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;
    if matches!(err, PrimDbError::Parse(_)) {
        writeln!(out, "Type 'help' for the list of commands.")?;
    }
    Ok(())
}

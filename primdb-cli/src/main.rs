mod middleware;
mod render;
mod repl;
mod session;

use clap::{ArgAction, Parser};
use middleware::{AssumeYes, Confirm, StdinPrompt};
use primdb::{Database, DbConfig, WriteMode};
use render::OutputFormat;
use session::Session;
use std::path::PathBuf;
use std::process;

/// primdb: a tiny table store driven by a one-line command language
#[derive(Parser)]
#[command(name = "primdb", version, about)]
struct Cli {
    /// Directory holding db_meta.json and one JSON file per table
    #[arg(long, env = "PRIMDB_DATA_DIR", default_value = primdb::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Do not ask before drop/delete
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print how long each select took
    #[arg(long)]
    timing: bool,

    /// Write files through a temporary file and rename (false: rewrite in place)
    #[arg(long, env = "PRIMDB_ATOMIC_WRITES", default_value_t = true, action = ArgAction::Set)]
    atomic_writes: bool,

    /// Keep interactive history in this file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Run a single command and exit (e.g. `primdb select users where id=1`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let write_mode = if cli.atomic_writes {
        WriteMode::Atomic
    } else {
        WriteMode::Overwrite
    };
    let db = Database::open(DbConfig::new(&cli.data_dir).with_write_mode(write_mode))?;

    let confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinPrompt)
    };
    let mut session = Session::new(db, cli.format, cli.timing, confirm);

    if cli.command.is_empty() {
        repl::run(&mut session, cli.history.as_deref())
    } else {
        let line = cli.command.join(" ");
        session.execute_line(&line, &mut std::io::stdout())?;
        Ok(())
    }
}

//! CLI smoke entry point.
//!
//! Usage: `richnote_cli [snapshot.sqlite3]`
//!
//! Prints the core version, opens a session over the given snapshot database
//! (in-memory when omitted) and prints the active document as HTML. Set
//! `RICHNOTE_LOG_DIR` to an absolute path to enable file logging.

use log::info;
use richnote_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, EditorSession,
    SessionConfig, SqliteSnapshotStore,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("richnote_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("richnote_core version={}", core_version());

    if let Some(log_dir) = std::env::var_os("RICHNOTE_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }

    let conn = match std::env::args_os().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteSnapshotStore::try_new(&conn)?;
    let session = EditorSession::open(store, SessionConfig::default())?;
    info!(
        "event=cli_render module=cli status=ok version={}",
        session.version()
    );
    println!("{}", session.render_html());
    Ok(())
}

// Only compile the UI module when the TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    run_ui_mode()
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use expense_tracker::{setup_database, LedgerStore};
    use rusqlite::Connection;
    use std::env;
    use std::path::PathBuf;

    // Where the credential database and the per-user ledger files live.
    // Overridable so tests and multiple installs never collide.
    let dir = env::var_os("EXPENSE_TRACKER_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;

    let conn = Connection::open(dir.join("user_database.db"))?;
    // Idempotent; run on every startup so the additive column upgrade applies
    setup_database(&conn)?;

    let store = LedgerStore::new(&dir);
    let mut app = ui::App::new(conn, store);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}

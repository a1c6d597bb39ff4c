// Credential Store - SQLite-backed user accounts
// One row per user; the ledger reference is derived from the username at
// registration and never changes afterwards.

use anyhow::Result;
use rusqlite::{params, Connection};
use std::fmt;

// ============================================================================
// ERRORS
// ============================================================================

/// Registration failure
#[derive(Debug)]
pub enum RegisterError {
    /// Username already taken (case-sensitive exact match)
    DuplicateUsername,
    /// Underlying storage failure
    Storage(rusqlite::Error),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::DuplicateUsername => write!(f, "Username already exists."),
            RegisterError::Storage(e) => write!(f, "Could not register user: {}", e),
        }
    }
}

impl std::error::Error for RegisterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegisterError::DuplicateUsername => None,
            RegisterError::Storage(e) => Some(e),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE,
            password TEXT,
            ledger_reference TEXT
        )",
        [],
    )?;

    // Additive upgrade: tables created by older builds predate the
    // ledger_reference column. The ALTER must not touch existing rows.
    let mut stmt = conn.prepare("PRAGMA table_info(users)")?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|c| c == "ledger_reference") {
        conn.execute("ALTER TABLE users ADD COLUMN ledger_reference TEXT", [])?;
    }

    Ok(())
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Stable derivation of a user's ledger reference.
/// Computed once at registration, but also used as the fallback for rows
/// inserted before the column existed.
pub fn ledger_reference_for(username: &str) -> String {
    format!("expenses_{}", username)
}

/// Create a new user. The UNIQUE constraint on username is the source of
/// truth for duplicates; we translate the constraint violation rather than
/// probing with a SELECT first.
pub fn register(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<String, RegisterError> {
    let reference = ledger_reference_for(username);

    let result = conn.execute(
        "INSERT INTO users (username, password, ledger_reference) VALUES (?1, ?2, ?3)",
        params![username, password, reference],
    );

    match result {
        Ok(_) => Ok(reference),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(RegisterError::DuplicateUsername)
        }
        Err(e) => Err(RegisterError::Storage(e)),
    }
}

/// Look up a user's ledger reference by exact username+password match.
/// Unknown user and wrong password are indistinguishable on purpose: the
/// caller only ever learns "no match".
///
/// Passwords are compared in plain text. That is the documented legacy
/// contract of this store, not an oversight.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Option<String>> {
    let mut stmt =
        conn.prepare("SELECT ledger_reference FROM users WHERE username = ?1 AND password = ?2")?;
    let mut rows = stmt.query(params![username, password])?;

    match rows.next()? {
        Some(row) => {
            // Rows that predate the additive column carry NULL here
            let stored: Option<String> = row.get(0)?;
            Ok(Some(stored.unwrap_or_else(|| ledger_reference_for(username))))
        }
        None => Ok(None),
    }
}

pub fn user_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_register_returns_derived_reference() {
        let conn = test_conn();

        let reference = register(&conn, "alice", "pw").unwrap();

        assert_eq!(reference, "expenses_alice");
        assert_eq!(user_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let conn = test_conn();

        register(&conn, "alice", "pw").unwrap();
        let second = register(&conn, "alice", "other-pw");

        assert!(matches!(second, Err(RegisterError::DuplicateUsername)));
        // Exactly one row survives the failed attempt
        assert_eq!(user_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_authenticate_exact_match_only() {
        let conn = test_conn();
        register(&conn, "alice", "pw").unwrap();

        assert_eq!(
            authenticate(&conn, "alice", "pw").unwrap(),
            Some("expenses_alice".to_string())
        );
        assert_eq!(authenticate(&conn, "alice", "wrong").unwrap(), None);
        assert_eq!(authenticate(&conn, "bob", "pw").unwrap(), None);
        // Case-sensitive exact match
        assert_eq!(authenticate(&conn, "Alice", "pw").unwrap(), None);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_conn();
        register(&conn, "alice", "pw").unwrap();

        // Safe to run on every startup
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(user_count(&conn).unwrap(), 1);
        assert_eq!(
            authenticate(&conn, "alice", "pw").unwrap(),
            Some("expenses_alice".to_string())
        );
    }

    #[test]
    fn test_additive_upgrade_preserves_legacy_rows() {
        let conn = Connection::open_in_memory().unwrap();

        // Legacy schema without the ledger_reference column
        conn.execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE,
                password TEXT
            )",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (username, password) VALUES ('carol', 'pw')",
            [],
        )
        .unwrap();

        setup_database(&conn).unwrap();

        // The legacy row is intact and resolves to the derived reference
        assert_eq!(user_count(&conn).unwrap(), 1);
        assert_eq!(
            authenticate(&conn, "carol", "pw").unwrap(),
            Some("expenses_carol".to_string())
        );

        // New registrations persist the reference directly
        register(&conn, "dave", "pw").unwrap();
        assert_eq!(
            authenticate(&conn, "dave", "pw").unwrap(),
            Some("expenses_dave".to_string())
        );
    }
}

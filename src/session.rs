// Session Flow - two-state login machine plus boundary validation
// The ledger reference is held by the session value and passed into every
// store and aggregator call. There is no ambient "current user" global, and
// nothing here survives a process restart.

use crate::auth::{self, RegisterError};
use crate::ledger::{Expense, LedgerStore};
use anyhow::Result;
use rusqlite::Connection;
use std::fmt;

// ============================================================================
// ERRORS
// ============================================================================

/// Login failure
#[derive(Debug)]
pub enum LoginError {
    /// Non-matching username/password pair. Deliberately generic: the caller
    /// cannot tell an unknown user from a wrong password.
    InvalidCredentials,
    /// Underlying storage failure
    Storage(anyhow::Error),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::InvalidCredentials => write!(f, "Invalid username or password."),
            LoginError::Storage(e) => write!(f, "Could not check credentials: {}", e),
        }
    }
}

impl std::error::Error for LoginError {}

/// Add-expense failure
#[derive(Debug)]
pub enum AddExpenseError {
    /// Amount did not parse as a number, or was not strictly positive.
    /// Raised before anything is persisted.
    InvalidAmount,
    /// Add attempted without an open session
    NotLoggedIn,
    /// Underlying storage failure
    Storage(anyhow::Error),
}

impl fmt::Display for AddExpenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddExpenseError::InvalidAmount => {
                write!(f, "Invalid amount. Please enter a valid positive number.")
            }
            AddExpenseError::NotLoggedIn => write!(f, "No user is logged in."),
            AddExpenseError::Storage(e) => write!(f, "Could not save expense: {}", e),
        }
    }
}

impl std::error::Error for AddExpenseError {}

// ============================================================================
// SESSION STATE
// ============================================================================

/// The whole session state machine: LoggedOut (initial) or LoggedIn with the
/// resolved ledger reference. Register keeps the state LoggedOut either way;
/// logout is unconditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    LoggedOut,
    LoggedIn { username: String, ledger: String },
}

impl Default for Session {
    fn default() -> Self {
        Session::LoggedOut
    }
}

impl Session {
    pub fn new() -> Self {
        Session::LoggedOut
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }

    /// Ledger reference bound to the current session, if any
    pub fn ledger(&self) -> Option<&str> {
        match self {
            Session::LoggedOut => None,
            Session::LoggedIn { ledger, .. } => Some(ledger),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Session::LoggedOut => None,
            Session::LoggedIn { username, .. } => Some(username),
        }
    }

    /// Register a new user. The session stays LoggedOut regardless of the
    /// outcome; only the success/duplicate result is surfaced.
    pub fn register(
        &self,
        conn: &Connection,
        username: &str,
        password: &str,
    ) -> Result<String, RegisterError> {
        auth::register(conn, username, password)
    }

    /// LoggedOut -> LoggedIn on a credential match, otherwise stay put
    pub fn login(
        &mut self,
        conn: &Connection,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        match auth::authenticate(conn, username, password) {
            Ok(Some(ledger)) => {
                *self = Session::LoggedIn {
                    username: username.to_string(),
                    ledger,
                };
                Ok(())
            }
            Ok(None) => Err(LoginError::InvalidCredentials),
            Err(e) => Err(LoginError::Storage(e)),
        }
    }

    /// LoggedIn -> LoggedOut, unconditionally
    pub fn logout(&mut self) {
        *self = Session::LoggedOut;
    }

    /// Validate at the boundary, then append. The store itself accepts
    /// whatever it is given, so the amount is vetted here before any write.
    /// Date and category are opaque strings, accepted as-is.
    pub fn add_expense(
        &self,
        store: &LedgerStore,
        date: &str,
        category: &str,
        amount: &str,
    ) -> Result<(), AddExpenseError> {
        let ledger = self.ledger().ok_or(AddExpenseError::NotLoggedIn)?;
        let amount = validate_amount(amount)?;

        store
            .append(ledger, Expense::new(date, category, amount))
            .map_err(AddExpenseError::Storage)
    }

    /// Truncate the current user's ledger
    pub fn clear_expenses(&self, store: &LedgerStore) -> Result<()> {
        if let Some(ledger) = self.ledger() {
            store.clear(ledger)?;
        }
        Ok(())
    }
}

/// Add-time amount rule: parses as f64 and strictly positive
pub fn validate_amount(input: &str) -> Result<f64, AddExpenseError> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| AddExpenseError::InvalidAmount)?;

    // is_finite first: "NaN" and "inf" parse successfully
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AddExpenseError::InvalidAmount);
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::setup_database;
    use tempfile::TempDir;

    fn test_env() -> (Connection, TempDir, LedgerStore) {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::new(dir.path());
        (conn, dir, store)
    }

    #[test]
    fn test_register_then_login_binds_ledger() {
        let (conn, _dir, _store) = test_env();
        let mut session = Session::new();

        let reference = session.register(&conn, "alice", "pw").unwrap();
        assert_eq!(reference, "expenses_alice");
        // Register alone does not open a session
        assert!(!session.is_logged_in());

        session.login(&conn, "alice", "pw").unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.ledger(), Some("expenses_alice"));
        assert_eq!(session.username(), Some("alice"));
    }

    #[test]
    fn test_failed_login_stays_logged_out() {
        let (conn, _dir, _store) = test_env();
        let mut session = Session::new();
        session.register(&conn, "alice", "pw").unwrap();

        let result = session.login(&conn, "alice", "wrong");

        assert!(matches!(result, Err(LoginError::InvalidCredentials)));
        assert_eq!(session, Session::LoggedOut);
    }

    #[test]
    fn test_logout_is_unconditional() {
        let (conn, _dir, _store) = test_env();
        let mut session = Session::new();
        session.register(&conn, "alice", "pw").unwrap();
        session.login(&conn, "alice", "pw").unwrap();

        session.logout();
        assert_eq!(session, Session::LoggedOut);

        // Logging out twice is a no-op, not an error
        session.logout();
        assert_eq!(session, Session::LoggedOut);
    }

    #[test]
    fn test_add_expense_validates_before_persisting() {
        let (conn, _dir, store) = test_env();
        let mut session = Session::new();
        session.register(&conn, "alice", "pw").unwrap();
        session.login(&conn, "alice", "pw").unwrap();

        let rejected = session.add_expense(&store, "2024-01-05", "Food", "abc");
        assert!(matches!(rejected, Err(AddExpenseError::InvalidAmount)));

        let rejected = session.add_expense(&store, "2024-01-05", "Food", "-5");
        assert!(matches!(rejected, Err(AddExpenseError::InvalidAmount)));

        let rejected = session.add_expense(&store, "2024-01-05", "Food", "0");
        assert!(matches!(rejected, Err(AddExpenseError::InvalidAmount)));

        // Nothing reached the file
        assert!(store.load("expenses_alice").is_empty());

        session
            .add_expense(&store, "2024-01-05", "Food", "12.50")
            .unwrap();
        assert_eq!(store.load("expenses_alice").len(), 1);
    }

    #[test]
    fn test_add_expense_requires_open_session() {
        let (_conn, _dir, store) = test_env();
        let session = Session::new();

        let result = session.add_expense(&store, "2024-01-05", "Food", "12.50");

        assert!(matches!(result, Err(AddExpenseError::NotLoggedIn)));
    }

    #[test]
    fn test_clear_expenses_empties_current_ledger() {
        let (conn, _dir, store) = test_env();
        let mut session = Session::new();
        session.register(&conn, "alice", "pw").unwrap();
        session.login(&conn, "alice", "pw").unwrap();
        session
            .add_expense(&store, "2024-01-05", "Food", "12.50")
            .unwrap();

        session.clear_expenses(&store).unwrap();

        assert!(store.load("expenses_alice").is_empty());
    }

    #[test]
    fn test_validate_amount_accepts_loose_spacing() {
        assert!(validate_amount(" 12.50 ").is_ok());
        assert!(validate_amount("800").is_ok());
        assert!(validate_amount("").is_err());
        assert!(validate_amount("12,50").is_err());
        assert!(validate_amount("NaN").is_err());
        assert!(validate_amount("inf").is_err());
    }
}

// Expense Tracker - Core Library
// Exposes the credential store, ledger store, aggregator, and session flow
// for use in the TUI binary and tests

pub mod auth;
pub mod ledger;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use auth::{
    authenticate, ledger_reference_for, register, setup_database, user_count, RegisterError,
};
pub use ledger::{Expense, LedgerStore};
pub use report::{is_empty, totals_by_category, totals_by_month};
pub use session::{AddExpenseError, LoginError, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

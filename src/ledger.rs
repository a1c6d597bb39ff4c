// Ledger Store - one delimited-text file per user
// Tolerant read policy: a missing, empty, or corrupt ledger behaves exactly
// like a fresh one. Load never raises; only writes can fail.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;

/// A single expense row as persisted in the per-user CSV.
///
/// The amount stays a string on this side of the boundary: historical files
/// may hold values the current add-time validation would reject, and those
/// rows must remain readable. Numeric interpretation happens in the
/// aggregator and at the add boundary, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Amount")]
    pub amount: String,
}

impl Expense {
    /// Build a record from an already-validated amount
    pub fn new(date: &str, category: &str, amount: f64) -> Self {
        Expense {
            date: date.to_string(),
            category: category.to_string(),
            amount: format!("{:.2}", amount),
        }
    }
}

/// Per-user ledger files under a single data directory.
/// A ledger reference maps to `<data_dir>/<reference>.csv` with the header
/// row `Date,Category,Amount`.
pub struct LedgerStore {
    data_dir: PathBuf,
}

impl LedgerStore {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        LedgerStore {
            data_dir: data_dir.into(),
        }
    }

    /// On-disk location for a ledger reference
    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", reference))
    }

    /// Load a ledger. Missing file, zero-byte file, header-only file, or an
    /// unopenable file all come back as an empty ledger; rows that fail to
    /// deserialize are skipped and the rest are kept. Append order within
    /// the file is preserved.
    pub fn load(&self, reference: &str) -> Vec<Expense> {
        let path = self.path_for(reference);
        if !path.exists() {
            return Vec::new();
        }

        let mut rdr = match csv::Reader::from_path(&path) {
            Ok(rdr) => rdr,
            Err(_) => return Vec::new(),
        };

        let mut expenses = Vec::new();
        for result in rdr.deserialize() {
            match result {
                Ok(expense) => expenses.push(expense),
                // Corrupt row: drop it, keep reading
                Err(_) => continue,
            }
        }

        expenses
    }

    /// Append one record: load current contents, push, rewrite the file.
    /// Read-modify-write is not atomic across concurrent writers; this store
    /// assumes the single-session design where exactly one ledger is open.
    pub fn append(&self, reference: &str, expense: Expense) -> Result<()> {
        let mut expenses = self.load(reference);
        expenses.push(expense);
        self.save(reference, &expenses)
    }

    /// Truncate the ledger to zero bytes regardless of prior contents.
    /// Creates the file if it does not exist yet; idempotent.
    pub fn clear(&self, reference: &str) -> Result<()> {
        let path = self.path_for(reference);
        File::create(&path)
            .with_context(|| format!("Failed to clear ledger {}", path.display()))?;

        Ok(())
    }

    fn save(&self, reference: &str, expenses: &[Expense]) -> Result<()> {
        let path = self.path_for(reference);
        let mut wtr = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to open ledger {} for writing", path.display()))?;

        for expense in expenses {
            wtr.serialize(expense)
                .context("Failed to serialize expense record")?;
        }
        wtr.flush().context("Failed to flush ledger file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_missing_ledger_is_empty() {
        let (_dir, store) = test_store();

        assert!(store.load("expenses_nobody").is_empty());
    }

    #[test]
    fn test_append_then_load_preserves_order() {
        let (_dir, store) = test_store();

        store
            .append("expenses_alice", Expense::new("2024-01-05", "Food", 12.5))
            .unwrap();
        store
            .append("expenses_alice", Expense::new("2024-01-20", "Food", 7.5))
            .unwrap();
        store
            .append("expenses_alice", Expense::new("2024-02-01", "Rent", 800.0))
            .unwrap();

        let expenses = store.load("expenses_alice");
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[0].category, "Food");
        assert_eq!(expenses[0].amount, "12.50");
        assert_eq!(expenses[2].date, "2024-02-01");
    }

    #[test]
    fn test_file_header_matches_legacy_format() {
        let (_dir, store) = test_store();

        store
            .append("expenses_alice", Expense::new("2024-01-05", "Food", 12.5))
            .unwrap();

        let contents = fs::read_to_string(store.path_for("expenses_alice")).unwrap();
        assert!(contents.starts_with("Date,Category,Amount\n"));
    }

    #[test]
    fn test_zero_byte_file_loads_as_empty() {
        let (_dir, store) = test_store();
        File::create(store.path_for("expenses_alice")).unwrap();

        assert!(store.load("expenses_alice").is_empty());
    }

    #[test]
    fn test_header_only_file_loads_as_empty() {
        let (_dir, store) = test_store();
        fs::write(store.path_for("expenses_alice"), "Date,Category,Amount\n").unwrap();

        assert!(store.load("expenses_alice").is_empty());
    }

    #[test]
    fn test_corrupt_rows_are_skipped_not_fatal() {
        let (_dir, store) = test_store();
        fs::write(
            store.path_for("expenses_alice"),
            "Date,Category,Amount\n2024-01-05,Food,12.50\nnot,a,valid,row,at,all\n2024-02-01,Rent,800\n",
        )
        .unwrap();

        let expenses = store.load("expenses_alice");
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].category, "Rent");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, store) = test_store();
        store
            .append("expenses_alice", Expense::new("2024-01-05", "Food", 12.5))
            .unwrap();

        store.clear("expenses_alice").unwrap();
        assert!(store.load("expenses_alice").is_empty());

        // Second clear lands in the same state, not an error
        store.clear("expenses_alice").unwrap();
        assert!(store.load("expenses_alice").is_empty());
    }

    #[test]
    fn test_clear_never_written_ledger() {
        let (_dir, store) = test_store();

        store.clear("expenses_alice").unwrap();

        assert!(store.load("expenses_alice").is_empty());
    }

    #[test]
    fn test_append_after_clear_starts_fresh() {
        let (_dir, store) = test_store();
        store
            .append("expenses_alice", Expense::new("2024-01-05", "Food", 12.5))
            .unwrap();
        store.clear("expenses_alice").unwrap();

        store
            .append("expenses_alice", Expense::new("2024-03-01", "Travel", 55.0))
            .unwrap();

        let expenses = store.load("expenses_alice");
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].category, "Travel");
    }

    #[test]
    fn test_sequential_appends_last_write_wins() {
        // Two stores over the same directory model sequential sessions.
        // Under the documented no-concurrency assumption the second append
        // sees the first one's write.
        let dir = TempDir::new().unwrap();
        let first = LedgerStore::new(dir.path());
        let second = LedgerStore::new(dir.path());

        first
            .append("expenses_alice", Expense::new("2024-01-05", "Food", 12.5))
            .unwrap();
        second
            .append("expenses_alice", Expense::new("2024-01-20", "Food", 7.5))
            .unwrap();

        assert_eq!(first.load("expenses_alice").len(), 2);
    }
}

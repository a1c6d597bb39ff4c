// Aggregator - category and month rollups over a loaded ledger
// Mirrors the tolerant-read policy of the ledger store: a record only
// participates in aggregation if both its date and its amount parse, and
// anything else is silently dropped rather than surfaced as an error.

use crate::ledger::Expense;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Records that survive parse-filtering: date as `%Y-%m-%d`, amount as f64.
/// Both filters apply to every aggregate, not just the one that needs the
/// failing field.
fn parsed_rows(expenses: &[Expense]) -> impl Iterator<Item = (NaiveDate, &str, f64)> + '_ {
    expenses.iter().filter_map(|e| {
        let date = NaiveDate::parse_from_str(e.date.trim(), DATE_FORMAT).ok()?;
        let amount: f64 = e.amount.trim().parse().ok()?;
        Some((date, e.category.as_str(), amount))
    })
}

/// Sum of amounts per category, sorted by category name so the chart
/// renders in a stable order.
pub fn totals_by_category(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();

    for (_, category, amount) in parsed_rows(expenses) {
        *totals.entry(category.to_string()).or_insert(0.0) += amount;
    }

    let mut result: Vec<_> = totals.into_iter().collect();
    result.sort_by(|a, b| a.0.cmp(&b.0));
    result
}

/// Sum of amounts per year-month ("YYYY-MM"), in chronological order.
/// The key format sorts lexicographically the same as chronologically, so a
/// BTreeMap gives the ordering for free.
pub fn totals_by_month(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for (date, _, amount) in parsed_rows(expenses) {
        let month = date.format("%Y-%m").to_string();
        *totals.entry(month).or_insert(0.0) += amount;
    }

    totals.into_iter().collect()
}

/// True when nothing survives filtering. The UI uses this to show a
/// "nothing to visualize" notice instead of an empty chart.
pub fn is_empty(expenses: &[Expense]) -> bool {
    parsed_rows(expenses).next().is_none()
}

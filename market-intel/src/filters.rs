//! Predicate helpers shared by the domain filters

use chrono::{DateTime, Utc};

/// Case-insensitive exact match, ignoring surrounding whitespace
pub(crate) fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Case-insensitive substring match
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Sort newest first (stable) and keep `n`
pub(crate) fn newest<R, F>(mut records: Vec<R>, n: usize, timestamp: F) -> Vec<R>
where
    F: Fn(&R) -> DateTime<Utc>,
{
    records.sort_by(|a, b| timestamp(b).cmp(&timestamp(a)));
    records.truncate(n);
    records
}

/// Normalized key for token symbols
pub(crate) fn token_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

//! Frequency tallies and percentage helpers shared by the stats views

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Frequency map that remembers first-seen order.
///
/// Ties in `top` are broken by whichever key was seen first.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`. Blank keys are ignored.
    pub fn add(&mut self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        match self.index.get(key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    pub fn extend<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for key in keys {
            self.add(key);
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map(|&slot| self.counts[slot].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `k` most frequent keys, highest count first
    pub fn top(&self, k: usize) -> Vec<(String, usize)> {
        let mut sorted = self.counts.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(k);
        sorted
    }
}

/// A single entry of a top-K list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked {
    pub key: String,
    pub count: usize,
}

impl From<(String, usize)> for Ranked {
    fn from((key, count): (String, usize)) -> Self {
        Self { key, count }
    }
}

/// `round(count / total * 100)`, or 0 when `total` is 0
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

/// First bucket holding the highest count, in declared order.
///
/// Returns `None` when every bucket is empty.
pub fn dominant<S: Copy>(buckets: &[(S, usize)]) -> Option<(S, usize)> {
    let mut best: Option<(S, usize)> = None;
    for &(bucket, count) in buckets {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((bucket, count)),
        }
    }
    best
}

/// Whether `at` falls within the last `days` days before `now` (inclusive).
///
/// A window reaching past the representable date range is unbounded.
pub fn within_window(at: DateTime<Utc>, days: i64, now: DateTime<Utc>) -> bool {
    match TimeDelta::try_days(days).and_then(|span| now.checked_sub_signed(span)) {
        Some(start) => at >= start,
        None => true,
    }
}

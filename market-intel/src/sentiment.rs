//! Sentiment buckets shared by the domain stats views

use common::{dominant, percentage};
use serde::{Deserialize, Serialize};

/// A closed set of sentiment values in a fixed declared order.
///
/// The declared order decides ties when picking the dominant bucket.
pub trait SentimentScale: Copy + Eq + 'static {
    const ALL: &'static [Self];

    /// Wire name of the value
    fn label(&self) -> &'static str;

    fn is_positive(&self) -> bool;
}

/// Parse a wire label (case-insensitive) into a scale value
pub fn parse_label<S: SentimentScale>(value: &str) -> Result<S, String> {
    S::ALL
        .iter()
        .copied()
        .find(|s| s.label().eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| {
            let expected: Vec<&str> = S::ALL.iter().map(|s| s.label()).collect();
            format!("unknown value '{}', expected one of: {}", value, expected.join(", "))
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBucket {
    pub label: String,
    pub count: usize,
    pub percentage: u32,
}

/// Counts per sentiment value, every declared value present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub total: usize,
    pub buckets: Vec<SentimentBucket>,
    pub dominant: Option<String>,
    pub dominant_percentage: u32,
}

impl SentimentBreakdown {
    pub fn tally<S, I>(values: I) -> Self
    where
        S: SentimentScale,
        I: IntoIterator<Item = S>,
    {
        let mut counts: Vec<(S, usize)> = S::ALL.iter().map(|s| (*s, 0)).collect();
        for value in values {
            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == value) {
                slot.1 += 1;
            }
        }

        let total: usize = counts.iter().map(|(_, c)| c).sum();
        let top = dominant(&counts);

        Self {
            total,
            buckets: counts
                .iter()
                .map(|(s, count)| SentimentBucket {
                    label: s.label().to_string(),
                    count: *count,
                    percentage: percentage(*count, total),
                })
                .collect(),
            dominant: top.map(|(s, _)| s.label().to_string()),
            dominant_percentage: top.map(|(_, c)| percentage(c, total)).unwrap_or(0),
        }
    }

    /// Count for a label (0 for unknown labels)
    pub fn count(&self, label: &str) -> usize {
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.count)
            .unwrap_or(0)
    }
}

//! Store error taxonomy
//!
//! Read-path failures (`Init`, `Read`, `Parse`) are absorbed by the stores and
//! surface only through `LoadOutcome::Degraded`. Write-path failures (`Write`,
//! `Serialize`) are returned to the immediate caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to initialize {domain} store at {}: {source}", path.display())]
    Init {
        domain: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {domain} records from {}: {source}", path.display())]
    Read {
        domain: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {domain} records in {}: {source}", path.display())]
    Parse {
        domain: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to save {domain} record: {source}")]
    Write {
        domain: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save {domain} record: {source}")]
    Serialize {
        domain: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether the error came from the write path (and must reach the caller)
    pub fn is_write_failure(&self) -> bool {
        matches!(self, StoreError::Write { .. } | StoreError::Serialize { .. })
    }
}

/// Result of reading a store file.
///
/// Readers never fail: a missing file is `Missing` and an unreadable or
/// corrupt file is `Degraded`. Both are treated as an empty store by
/// `into_records`.
#[derive(Debug)]
pub enum LoadOutcome<R> {
    Loaded(Vec<R>),
    Missing,
    Degraded(StoreError),
}

impl<R> LoadOutcome<R> {
    pub fn into_records(self) -> Vec<R> {
        match self {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Missing | LoadOutcome::Degraded(_) => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadOutcome::Degraded(_))
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            LoadOutcome::Degraded(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_message() {
        let err = StoreError::Write {
            domain: "macro analysis",
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to save macro analysis record"));
        assert!(err.is_write_failure());
    }

    #[test]
    fn test_degraded_outcome_is_empty() {
        let outcome: LoadOutcome<u32> = LoadOutcome::Degraded(StoreError::Read {
            domain: "news",
            path: PathBuf::from("data/news.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        });
        assert!(outcome.is_degraded());
        assert!(outcome.error().is_some());
        assert!(outcome.into_records().is_empty());

        let missing: LoadOutcome<u32> = LoadOutcome::Missing;
        assert!(!missing.is_degraded());
        assert!(missing.into_records().is_empty());
    }
}

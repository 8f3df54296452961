//! Flat-file record storage
//!
//! Every domain persists one JSON array in one file. A store read never fails
//! the caller; a store write does. On each save the full array is re-sorted
//! newest first and truncated to the domain's cap.

use crate::error::{LoadOutcome, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A record kind that owns one store file
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable domain name, used in logs and error messages
    const DOMAIN: &'static str;

    /// Prefix of generated ids: `<prefix>-<millis>-<disambiguator>`
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Timestamp used for retention ordering
    fn recency(&self) -> DateTime<Utc>;

    fn disambiguator(&self) -> String {
        short_uuid()
    }

    /// Upsert key. Records for which this returns true are replaced on save
    /// instead of appended alongside.
    fn same_entity(&self, _other: &Self) -> bool {
        false
    }
}

/// First 8 hex characters of a random v4 uuid
pub fn short_uuid() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Build a write-time id for a record
pub fn generate_id<R: Record>(record: &R, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", R::ID_PREFIX, at.timestamp_millis(), record.disambiguator())
}

/// What happened to the store contents during a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub replaced: bool,
    pub retained: usize,
    pub dropped: usize,
}

/// Insert or replace `record`, re-sort newest first and truncate to `cap`.
///
/// Returns the record as stored (with its id assigned).
pub fn apply_save<R: Record>(records: &mut Vec<R>, mut record: R, cap: usize) -> (R, SaveReport) {
    // Every matching record goes; the first match lends its id
    let mut inherited: Option<String> = None;
    records.retain(|r| {
        if !r.same_entity(&record) {
            return true;
        }
        if inherited.is_none() {
            inherited = Some(r.id().to_string());
        }
        false
    });
    let replaced = inherited.is_some();

    if let Some(previous_id) = inherited {
        if record.id().is_empty() {
            record.set_id(previous_id);
        }
    }

    if record.id().is_empty() {
        let id = generate_id(&record, Utc::now());
        record.set_id(id);
    }

    // Stable sort: on equal timestamps the freshly saved record stays first
    records.insert(0, record.clone());
    records.sort_by(|a, b| b.recency().cmp(&a.recency()));

    let dropped = records.len().saturating_sub(cap);
    records.truncate(cap);

    let report = SaveReport {
        replaced,
        retained: records.len(),
        dropped,
    };
    (record, report)
}

/// Storage backend for one record domain
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Maximum number of records kept after a save
    fn cap(&self) -> usize;

    /// Make sure the backing storage exists. Idempotent.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Read every record, reporting how the read went
    async fn load(&self) -> LoadOutcome<R>;

    /// Read every record, treating any failure as an empty store
    async fn get_all(&self) -> Vec<R> {
        let outcome = self.load().await;
        if let Some(e) = outcome.error() {
            warn!("Treating {} store as empty: {}", R::DOMAIN, e);
        }
        outcome.into_records()
    }

    /// Persist a record and return it with its assigned id
    async fn save(&self, record: R) -> Result<R, StoreError>;
}

/// JSON array file backend
pub struct JsonFileStore<R> {
    path: PathBuf,
    cap: usize,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> JsonFileStore<R> {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
            _ => Ok(()),
        }
    }

    async fn write_all(&self, records: &[R]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Serialize {
            domain: R::DOMAIN,
            source,
        })?;

        self.ensure_parent()
            .await
            .map_err(|source| StoreError::Write { domain: R::DOMAIN, source })?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write { domain: R::DOMAIN, source })
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for JsonFileStore<R> {
    fn cap(&self) -> usize {
        self.cap
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        let init_err = |source| StoreError::Init {
            domain: R::DOMAIN,
            path: self.path.clone(),
            source,
        };

        self.ensure_parent().await.map_err(init_err)?;

        match tokio::fs::try_exists(&self.path).await.map_err(init_err)? {
            true => {
                debug!("{} store already present at {}", R::DOMAIN, self.path.display());
            }
            false => {
                tokio::fs::write(&self.path, "[]").await.map_err(init_err)?;
                info!("Created empty {} store at {}", R::DOMAIN, self.path.display());
            }
        }
        Ok(())
    }

    async fn load(&self) -> LoadOutcome<R> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = self.initialize().await {
                    warn!("{}", e);
                }
                return LoadOutcome::Missing;
            }
            Err(source) => {
                return LoadOutcome::Degraded(StoreError::Read {
                    domain: R::DOMAIN,
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<Vec<R>>(&content) {
            Ok(records) => LoadOutcome::Loaded(records),
            Err(source) => LoadOutcome::Degraded(StoreError::Parse {
                domain: R::DOMAIN,
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&self, record: R) -> Result<R, StoreError> {
        let mut records = match self.load().await {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Degraded(e) => {
                warn!("Overwriting unreadable {} store: {}", R::DOMAIN, e);
                Vec::new()
            }
        };

        let (stored, report) = apply_save(&mut records, record, self.cap);

        if let Err(e) = self.write_all(&records).await {
            tracing::error!("{}", e);
            return Err(e);
        }

        debug!(
            "Saved {} record {} (replaced: {}, retained: {}, dropped: {})",
            R::DOMAIN,
            stored.id(),
            report.replaced,
            report.retained,
            report.dropped
        );
        Ok(stored)
    }
}

/// In-memory backend (for testing and one-off exports)
pub struct InMemoryStore<R> {
    records: RwLock<Vec<R>>,
    cap: usize,
}

impl<R: Record> InMemoryStore<R> {
    pub fn new(cap: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            cap,
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryStore<R> {
    fn cap(&self) -> usize {
        self.cap
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self) -> LoadOutcome<R> {
        LoadOutcome::Loaded(self.records.read().await.clone())
    }

    async fn save(&self, record: R) -> Result<R, StoreError> {
        let mut records = self.records.write().await;
        let (stored, report) = apply_save(&mut *records, record, self.cap);
        debug!(
            "Saved {} record {} in memory (retained: {})",
            R::DOMAIN,
            stored.id(),
            report.retained
        );
        Ok(stored)
    }
}

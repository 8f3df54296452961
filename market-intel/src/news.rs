//! News store - articles enriched with macro impact and related assets

use crate::filters::{contains_ci, eq_ci, newest, token_key};
use crate::sentiment::{parse_label, SentimentBreakdown, SentimentScale};
use chrono::{DateTime, Utc};
use common::{within_window, InMemoryStore, JsonFileStore, LoadOutcome, Ranked, Record, RecordStore, StoreError, Tally};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const TOP_CATEGORIES: usize = 10;
const TOP_ASSETS: usize = 10;
const TOP_SOURCES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsSentiment {
    Positive,
    Negative,
    Neutral,
}

impl SentimentScale for NewsSentiment {
    const ALL: &'static [Self] = &[NewsSentiment::Positive, NewsSentiment::Negative, NewsSentiment::Neutral];

    fn label(&self) -> &'static str {
        match self {
            NewsSentiment::Positive => "positive",
            NewsSentiment::Negative => "negative",
            NewsSentiment::Neutral => "neutral",
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, NewsSentiment::Positive)
    }
}

impl FromStr for NewsSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s)
    }
}

impl fmt::Display for NewsSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How hard a story is expected to hit the markets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .iter()
            .copied()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

/// Market cycle a story is associated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Accumulation,
    Markup,
    Distribution,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroImpact {
    pub severity: Severity,
    pub sentiment: NewsSentiment,
    #[serde(default)]
    pub markets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    #[serde(default, alias = "summary")]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub macro_impact: MacroImpact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_implications: Option<String>,
    #[serde(default)]
    pub related_assets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cycle: Option<CyclePhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_signal: Option<String>,
}

impl Record for NewsRecord {
    const DOMAIN: &'static str = "news";
    const ID_PREFIX: &'static str = "news";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn recency(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsStats {
    pub total_articles: usize,
    pub recent_articles: usize,
    pub window_days: i64,
    pub sentiment: SentimentBreakdown,
    /// Recent articles per severity, in severity order
    pub severity_distribution: Vec<Ranked>,
    pub top_categories: Vec<Ranked>,
    pub top_assets: Vec<Ranked>,
    pub top_sources: Vec<Ranked>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl NewsStats {
    /// Tallies cover the recent window; `last_updated` covers every article
    pub fn from_records(articles: &[NewsRecord], window_days: i64, now: DateTime<Utc>) -> Self {
        let recent: Vec<&NewsRecord> = articles
            .iter()
            .filter(|a| within_window(a.timestamp, window_days, now))
            .collect();

        let mut categories = Tally::new();
        let mut assets = Tally::new();
        let mut sources = Tally::new();
        for article in &recent {
            categories.extend(article.categories.iter().map(String::as_str));
            for asset in &article.related_assets {
                assets.add(&token_key(asset));
            }
            sources.add(&article.source);
        }

        let severity_distribution = Severity::ALL
            .iter()
            .map(|severity| Ranked {
                key: severity.label().to_string(),
                count: recent.iter().filter(|a| a.macro_impact.severity == *severity).count(),
            })
            .collect();

        Self {
            total_articles: articles.len(),
            recent_articles: recent.len(),
            window_days,
            sentiment: SentimentBreakdown::tally(recent.iter().map(|a| a.macro_impact.sentiment)),
            severity_distribution,
            top_categories: categories.top(TOP_CATEGORIES).into_iter().map(Ranked::from).collect(),
            top_assets: assets.top(TOP_ASSETS).into_iter().map(Ranked::from).collect(),
            top_sources: sources.top(TOP_SOURCES).into_iter().map(Ranked::from).collect(),
            last_updated: articles.iter().map(|a| a.timestamp).max(),
        }
    }
}

/// Store for news articles
pub struct NewsStore {
    backend: Box<dyn RecordStore<NewsRecord>>,
}

impl NewsStore {
    pub fn open(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            backend: Box::new(JsonFileStore::new(path, cap)),
        }
    }

    pub fn in_memory(cap: usize) -> Self {
        Self {
            backend: Box::new(InMemoryStore::new(cap)),
        }
    }

    pub async fn initialize(&self) {
        if let Err(e) = self.backend.initialize().await {
            warn!("{}", e);
        }
    }

    pub async fn load(&self) -> LoadOutcome<NewsRecord> {
        self.backend.load().await
    }

    pub async fn get_all(&self) -> Vec<NewsRecord> {
        self.backend.get_all().await
    }

    pub async fn save(&self, article: NewsRecord) -> Result<NewsRecord, StoreError> {
        let saved = self.backend.save(article).await?;
        debug!("Stored news article {} from {}", saved.id, saved.source);
        Ok(saved)
    }

    pub async fn latest(&self, limit: usize) -> Vec<NewsRecord> {
        newest(self.get_all().await, limit, |a| a.timestamp)
    }

    pub async fn by_category(&self, category: &str) -> Vec<NewsRecord> {
        self.filtered(|a| a.categories.iter().any(|c| eq_ci(c, category))).await
    }

    pub async fn by_asset(&self, asset: &str) -> Vec<NewsRecord> {
        self.filtered(|a| a.related_assets.iter().any(|s| eq_ci(s, asset))).await
    }

    pub async fn by_sentiment(&self, sentiment: NewsSentiment) -> Vec<NewsRecord> {
        self.filtered(|a| a.macro_impact.sentiment == sentiment).await
    }

    pub async fn by_severity(&self, severity: Severity) -> Vec<NewsRecord> {
        self.filtered(|a| a.macro_impact.severity == severity).await
    }

    pub async fn by_source(&self, source: &str) -> Vec<NewsRecord> {
        self.filtered(|a| eq_ci(&a.source, source)).await
    }

    /// Articles whose title or content mention `text`
    pub async fn search(&self, text: &str) -> Vec<NewsRecord> {
        self.filtered(|a| contains_ci(&a.title, text) || contains_ci(&a.content, text))
            .await
    }

    pub async fn recent(&self, days: i64) -> Vec<NewsRecord> {
        self.recent_at(days, Utc::now()).await
    }

    pub async fn recent_at(&self, days: i64, now: DateTime<Utc>) -> Vec<NewsRecord> {
        self.filtered(|a| within_window(a.timestamp, days, now)).await
    }

    pub async fn stats(&self, window_days: i64) -> NewsStats {
        self.stats_at(window_days, Utc::now()).await
    }

    pub async fn stats_at(&self, window_days: i64, now: DateTime<Utc>) -> NewsStats {
        NewsStats::from_records(&self.get_all().await, window_days, now)
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<NewsRecord>
    where
        F: Fn(&NewsRecord) -> bool,
    {
        self.get_all().await.into_iter().filter(|a| predicate(a)).collect()
    }
}

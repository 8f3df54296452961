//! Macro analyses - periodic market-wide readings
//!
//! Each analysis captures the overall sentiment, the macro signals behind it,
//! emerging narratives, mentioned tokens and the perceived market cycle
//! phase. Only the 20 most recent analyses are kept by default.
//!
//! Records are persisted with the field names the analysis pipeline emits
//! (`sentimento_geral`, `tokens_mencionados`, ...).

use crate::filters::{contains_ci, eq_ci, newest, token_key};
use crate::sentiment::{parse_label, SentimentBreakdown, SentimentScale};
use chrono::{DateTime, Utc};
use common::{within_window, InMemoryStore, JsonFileStore, LoadOutcome, Ranked, Record, RecordStore, StoreError, Tally};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const TOP_TOKENS: usize = 10;
const TOP_NARRATIVES: usize = 5;

/// Overall market sentiment of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroSentiment {
    Bullish,
    Bearish,
    Neutro,
}

impl SentimentScale for MacroSentiment {
    const ALL: &'static [Self] = &[MacroSentiment::Bullish, MacroSentiment::Bearish, MacroSentiment::Neutro];

    fn label(&self) -> &'static str {
        match self {
            MacroSentiment::Bullish => "bullish",
            MacroSentiment::Bearish => "bearish",
            MacroSentiment::Neutro => "neutro",
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, MacroSentiment::Bullish)
    }
}

impl FromStr for MacroSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s)
    }
}

impl fmt::Display for MacroSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Market cycle phase (Wyckoff-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketPhase {
    #[serde(rename = "acumulacao")]
    Accumulation,
    #[serde(rename = "alta")]
    Markup,
    #[serde(rename = "distribuicao")]
    Distribution,
    #[serde(rename = "baixa")]
    Markdown,
}

impl MarketPhase {
    pub const ALL: [MarketPhase; 4] = [
        MarketPhase::Accumulation,
        MarketPhase::Markup,
        MarketPhase::Distribution,
        MarketPhase::Markdown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MarketPhase::Accumulation => "acumulacao",
            MarketPhase::Markup => "alta",
            MarketPhase::Distribution => "distribuicao",
            MarketPhase::Markdown => "baixa",
        }
    }
}

impl FromStr for MarketPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketPhase::ALL
            .iter()
            .copied()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown market phase '{}'", s))
    }
}

/// One macro analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAnalysis {
    #[serde(default)]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "sentimento_geral")]
    pub sentiment: MacroSentiment,
    #[serde(rename = "sinais_macro", default)]
    pub macro_signals: String,
    #[serde(rename = "narrativas_emergentes", default)]
    pub emerging_narratives: Vec<String>,
    #[serde(rename = "tokens_mencionados", default)]
    pub mentioned_tokens: Vec<String>,
    #[serde(rename = "fase_ciclo_mercado")]
    pub market_phase: MarketPhase,
    #[serde(rename = "justificativa", default)]
    pub rationale: String,
}

impl Record for MacroAnalysis {
    const DOMAIN: &'static str = "macro analysis";
    const ID_PREFIX: &'static str = "macro";

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

/// Aggregated view over the stored analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAnalysisStats {
    pub total_analyses: usize,
    pub recent_analyses: usize,
    pub window_days: i64,
    /// Over all stored analyses
    pub sentiment: SentimentBreakdown,
    /// Over all stored analyses, in cycle order
    pub phase_distribution: Vec<Ranked>,
    /// Over the recent window
    pub top_tokens: Vec<Ranked>,
    /// Over the recent window
    pub top_narratives: Vec<Ranked>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl MacroAnalysisStats {
    pub fn from_records(analyses: &[MacroAnalysis], window_days: i64, now: DateTime<Utc>) -> Self {
        let recent: Vec<&MacroAnalysis> = analyses
            .iter()
            .filter(|a| within_window(a.timestamp, window_days, now))
            .collect();

        let mut tokens = Tally::new();
        let mut narratives = Tally::new();
        for analysis in &recent {
            for token in &analysis.mentioned_tokens {
                tokens.add(&token_key(token));
            }
            narratives.extend(analysis.emerging_narratives.iter().map(String::as_str));
        }

        let phase_distribution = MarketPhase::ALL
            .iter()
            .map(|phase| Ranked {
                key: phase.label().to_string(),
                count: analyses.iter().filter(|a| a.market_phase == *phase).count(),
            })
            .collect();

        Self {
            total_analyses: analyses.len(),
            recent_analyses: recent.len(),
            window_days,
            sentiment: SentimentBreakdown::tally(analyses.iter().map(|a| a.sentiment)),
            phase_distribution,
            top_tokens: tokens.top(TOP_TOKENS).into_iter().map(Ranked::from).collect(),
            top_narratives: narratives.top(TOP_NARRATIVES).into_iter().map(Ranked::from).collect(),
            last_updated: analyses.iter().map(|a| a.timestamp).max(),
        }
    }
}

/// Store for macro analyses
pub struct MacroAnalysisStore {
    backend: Box<dyn RecordStore<MacroAnalysis>>,
}

impl MacroAnalysisStore {
    /// File-backed store
    pub fn open(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            backend: Box::new(JsonFileStore::new(path, cap)),
        }
    }

    /// Memory-backed store (for testing)
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

    pub async fn load(&self) -> LoadOutcome<MacroAnalysis> {
        self.backend.load().await
    }

    pub async fn get_all(&self) -> Vec<MacroAnalysis> {
        self.backend.get_all().await
    }

    pub async fn save(&self, analysis: MacroAnalysis) -> Result<MacroAnalysis, StoreError> {
        let saved = self.backend.save(analysis).await?;
        debug!("Stored macro analysis {} ({})", saved.id, saved.sentiment);
        Ok(saved)
    }

    /// Most recent analysis by timestamp
    pub async fn latest_analysis(&self) -> Option<MacroAnalysis> {
        self.latest(1).await.into_iter().next()
    }

    pub async fn latest(&self, limit: usize) -> Vec<MacroAnalysis> {
        newest(self.get_all().await, limit, |a| a.timestamp)
    }

    pub async fn by_sentiment(&self, sentiment: MacroSentiment) -> Vec<MacroAnalysis> {
        self.filtered(|a| a.sentiment == sentiment).await
    }

    pub async fn by_token(&self, token: &str) -> Vec<MacroAnalysis> {
        self.filtered(|a| a.mentioned_tokens.iter().any(|t| eq_ci(t, token))).await
    }

    pub async fn by_narrative(&self, narrative: &str) -> Vec<MacroAnalysis> {
        self.filtered(|a| a.emerging_narratives.iter().any(|n| contains_ci(n, narrative)))
            .await
    }

    pub async fn by_phase(&self, phase: MarketPhase) -> Vec<MacroAnalysis> {
        self.filtered(|a| a.market_phase == phase).await
    }

    /// Analyses from the last `days` days
    pub async fn by_period(&self, days: i64) -> Vec<MacroAnalysis> {
        self.by_period_at(days, Utc::now()).await
    }

    pub async fn by_period_at(&self, days: i64, now: DateTime<Utc>) -> Vec<MacroAnalysis> {
        self.filtered(|a| within_window(a.timestamp, days, now)).await
    }

    pub async fn analysis_stats(&self, window_days: i64) -> MacroAnalysisStats {
        self.analysis_stats_at(window_days, Utc::now()).await
    }

    pub async fn analysis_stats_at(&self, window_days: i64, now: DateTime<Utc>) -> MacroAnalysisStats {
        MacroAnalysisStats::from_records(&self.get_all().await, window_days, now)
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<MacroAnalysis>
    where
        F: Fn(&MacroAnalysis) -> bool,
    {
        self.get_all().await.into_iter().filter(|a| predicate(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn analysis(day: u32, sentiment: MacroSentiment) -> MacroAnalysis {
        MacroAnalysis {
            id: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            sentiment,
            macro_signals: "DXY weakening, ETF inflows".to_string(),
            emerging_narratives: vec!["Bitcoin ETFs".to_string(), "Restaking".to_string()],
            mentioned_tokens: vec!["BTC".to_string(), "eth".to_string()],
            market_phase: MarketPhase::Markup,
            rationale: "Liquidity is improving".to_string(),
        }
    }

    async fn seeded(dir: &TempDir) -> MacroAnalysisStore {
        let store = MacroAnalysisStore::open(dir.path().join("macro_analyses.json"), 20);
        store.initialize().await;
        store.save(analysis(1, MacroSentiment::Bullish)).await.unwrap();
        store.save(analysis(3, MacroSentiment::Bearish)).await.unwrap();
        store.save(analysis(2, MacroSentiment::Bullish)).await.unwrap();
        store
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(analysis(1, MacroSentiment::Neutro)).unwrap();
        assert_eq!(value["sentimento_geral"], "neutro");
        assert_eq!(value["fase_ciclo_mercado"], "alta");
        assert!(value["tokens_mencionados"].is_array());
        assert!(value.get("sentiment").is_none());
    }

    #[test]
    fn test_unknown_sentiment_is_rejected() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00Z","sentimento_geral":"euphoric","fase_ciclo_mercado":"alta"}"#;
        assert!(serde_json::from_str::<MacroAnalysis>(json).is_err());
        assert!("euphoric".parse::<MacroSentiment>().is_err());
        assert_eq!("Bearish".parse::<MacroSentiment>(), Ok(MacroSentiment::Bearish));
    }

    #[tokio::test]
    async fn test_latest_analysis_is_newest_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;

        let latest = store.latest_analysis().await.unwrap();
        assert_eq!(latest.timestamp, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(latest.sentiment, MacroSentiment::Bearish);
        assert!(latest.id.starts_with("macro-"));
    }

    #[tokio::test]
    async fn test_stats_sentiment_counts() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;

        let now = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let stats = store.analysis_stats_at(7, now).await;
        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.recent_analyses, 3);
        assert_eq!(stats.sentiment.count("bullish"), 2);
        assert_eq!(stats.sentiment.count("bearish"), 1);
        assert_eq!(stats.sentiment.count("neutro"), 0);
        assert_eq!(stats.sentiment.dominant.as_deref(), Some("bullish"));
        assert_eq!(stats.sentiment.dominant_percentage, 67);
        assert_eq!(stats.top_tokens[0], Ranked { key: "BTC".to_string(), count: 3 });
        assert_eq!(stats.top_tokens[1], Ranked { key: "ETH".to_string(), count: 3 });
        assert_eq!(stats.phase_distribution[1], Ranked { key: "alta".to_string(), count: 3 });
        assert_eq!(stats.last_updated, Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_stats_tops_use_recent_window() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let stats = store.analysis_stats_at(7, now).await;
        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.recent_analyses, 0);
        assert!(stats.top_tokens.is_empty());
        assert_eq!(stats.sentiment.total, 3);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_by_period_excludes_older_analyses() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;

        let now = Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap();
        let recent = store.by_period_at(2, now).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_by_period_with_huge_window_returns_everything() {
        let store = MacroAnalysisStore::in_memory(20);
        store.save(analysis(1, MacroSentiment::Bullish)).await.unwrap();

        assert_eq!(store.by_period(100_000_000).await.len(), 1);
        assert_eq!(store.by_period(i64::MAX).await.len(), 1);
        assert_eq!(store.analysis_stats(i64::MAX).await.recent_analyses, 1);
    }

    #[tokio::test]
    async fn test_truncates_to_cap_keeping_newest() {
        let store = MacroAnalysisStore::in_memory(20);
        for day in 1..=21 {
            store.save(analysis(day, MacroSentiment::Neutro)).await.unwrap();
        }

        let all = store.get_all().await;
        assert_eq!(all.len(), 20);
        let oldest = all.iter().map(|a| a.timestamp).min().unwrap();
        assert_eq!(oldest, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_filters() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;

        let bullish = store.by_sentiment(MacroSentiment::Bullish).await;
        assert_eq!(bullish.len(), 2);
        assert_eq!(bullish, store.by_sentiment(MacroSentiment::Bullish).await);

        assert_eq!(store.by_token("ETH").await.len(), 3);
        assert!(store.by_token("SOL").await.is_empty());
        assert_eq!(store.by_narrative("etf").await.len(), 3);
        assert!(store.by_phase(MarketPhase::Markdown).await.is_empty());
        assert_eq!(store.latest(2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_stats() {
        let dir = TempDir::new().unwrap();
        let store = MacroAnalysisStore::open(dir.path().join("macro_analyses.json"), 20);

        let stats = store.analysis_stats(7).await;
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.sentiment.dominant_percentage, 0);
        assert_eq!(stats.last_updated, None);
        assert!(store.latest_analysis().await.is_none());
    }
}

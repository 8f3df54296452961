//! Video transcript analyses
//!
//! One record per analyzed video: overall sentiment, narratives with their
//! perceived strength, token mentions with a per-token sentiment, and the
//! macro signals, risks and opportunities called out by the host.

use crate::filters::{contains_ci, eq_ci, newest, token_key};
use crate::sentiment::{parse_label, SentimentBreakdown, SentimentScale};
use chrono::{DateTime, Utc};
use common::store::short_uuid;
use common::{dominant, percentage, within_window, InMemoryStore, JsonFileStore, LoadOutcome, Ranked, Record, RecordStore, StoreError, Tally};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const TOP_TOKENS: usize = 10;
const TOP_NARRATIVES: usize = 5;
const TOP_CHANNELS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentScale for VideoSentiment {
    const ALL: &'static [Self] = &[VideoSentiment::Bullish, VideoSentiment::Bearish, VideoSentiment::Neutral];

    fn label(&self) -> &'static str {
        match self {
            VideoSentiment::Bullish => "bullish",
            VideoSentiment::Bearish => "bearish",
            VideoSentiment::Neutral => "neutral",
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, VideoSentiment::Bullish)
    }
}

impl FromStr for VideoSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s)
    }
}

impl fmt::Display for VideoSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSentiment {
    Positive,
    Negative,
    Neutral,
}

impl SentimentScale for TokenSentiment {
    const ALL: &'static [Self] = &[TokenSentiment::Positive, TokenSentiment::Negative, TokenSentiment::Neutral];

    fn label(&self) -> &'static str {
        match self {
            TokenSentiment::Positive => "positive",
            TokenSentiment::Negative => "negative",
            TokenSentiment::Neutral => "neutral",
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, TokenSentiment::Positive)
    }
}

/// Declared strongest first; ties in `NarrativeSummary` favor the stronger value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStrength {
    Strong,
    Moderate,
    Weak,
}

impl NarrativeStrength {
    pub const ALL: [NarrativeStrength; 3] = [NarrativeStrength::Strong, NarrativeStrength::Moderate, NarrativeStrength::Weak];

    pub fn label(&self) -> &'static str {
        match self {
            NarrativeStrength::Strong => "strong",
            NarrativeStrength::Moderate => "moderate",
            NarrativeStrength::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAssessment {
    pub overall: VideoSentiment,
    /// Conviction of the host, as scored by the analyzer
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoNarrative {
    pub name: String,
    pub strength: NarrativeStrength,
    #[serde(default)]
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMention {
    pub symbol: String,
    pub sentiment: TokenSentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    #[serde(default)]
    pub id: String,
    pub video_id: String,
    pub video_title: String,
    pub channel_name: String,
    #[serde(default)]
    pub channel_url: String,
    pub published_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
    pub sentiment: SentimentAssessment,
    #[serde(default)]
    pub narratives: Vec<VideoNarrative>,
    #[serde(default)]
    pub mentioned_tokens: Vec<TokenMention>,
    #[serde(default)]
    pub macro_signals: Vec<String>,
    #[serde(default)]
    pub perceived_risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl Record for VideoAnalysis {
    const DOMAIN: &'static str = "video analysis";
    const ID_PREFIX: &'static str = "video";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn recency(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    fn disambiguator(&self) -> String {
        match self.video_id.trim() {
            "" => short_uuid(),
            video_id => video_id.to_string(),
        }
    }
}

/// Mentions of one token across videos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub symbol: String,
    pub mentions: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_percentage: u32,
}

/// Mentions of one narrative across videos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeSummary {
    pub name: String,
    pub mentions: usize,
    pub dominant_strength: Option<NarrativeStrength>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub total_videos: usize,
    pub recent_videos: usize,
    pub window_days: i64,
    pub sentiment: SentimentBreakdown,
    pub top_tokens: Vec<TokenSummary>,
    pub top_narratives: Vec<NarrativeSummary>,
    pub top_channels: Vec<Ranked>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl VideoStats {
    pub fn from_records(videos: &[VideoAnalysis], window_days: i64, now: DateTime<Utc>) -> Self {
        let recent: Vec<&VideoAnalysis> = videos
            .iter()
            .filter(|v| within_window(v.analyzed_at, window_days, now))
            .collect();

        let mut tokens = Tally::new();
        let mut token_sentiment: HashMap<String, [usize; 3]> = HashMap::new();
        let mut narratives = Tally::new();
        let mut narrative_strength: HashMap<String, [usize; 3]> = HashMap::new();
        let mut channels = Tally::new();

        for video in &recent {
            channels.add(&video.channel_name);

            for mention in &video.mentioned_tokens {
                let key = token_key(&mention.symbol);
                tokens.add(&key);
                let slot = match mention.sentiment {
                    TokenSentiment::Positive => 0,
                    TokenSentiment::Negative => 1,
                    TokenSentiment::Neutral => 2,
                };
                token_sentiment.entry(key).or_default()[slot] += 1;
            }

            for narrative in &video.narratives {
                let key = narrative.name.trim().to_string();
                narratives.add(&key);
                let slot = NarrativeStrength::ALL
                    .iter()
                    .position(|s| *s == narrative.strength)
                    .unwrap_or(1);
                narrative_strength.entry(key).or_default()[slot] += 1;
            }
        }

        let top_tokens = tokens
            .top(TOP_TOKENS)
            .into_iter()
            .map(|(symbol, mentions)| {
                let [positive, negative, neutral] = token_sentiment.get(&symbol).copied().unwrap_or_default();
                TokenSummary {
                    positive_percentage: percentage(positive, mentions),
                    symbol,
                    mentions,
                    positive,
                    negative,
                    neutral,
                }
            })
            .collect();

        let top_narratives = narratives
            .top(TOP_NARRATIVES)
            .into_iter()
            .map(|(name, mentions)| {
                let counts = narrative_strength.get(&name).copied().unwrap_or_default();
                let buckets: Vec<(NarrativeStrength, usize)> =
                    NarrativeStrength::ALL.iter().copied().zip(counts).collect();
                NarrativeSummary {
                    dominant_strength: dominant(&buckets).map(|(s, _)| s),
                    name,
                    mentions,
                }
            })
            .collect();

        Self {
            total_videos: videos.len(),
            recent_videos: recent.len(),
            window_days,
            sentiment: SentimentBreakdown::tally(recent.iter().map(|v| v.sentiment.overall)),
            top_tokens,
            top_narratives,
            top_channels: channels.top(TOP_CHANNELS).into_iter().map(Ranked::from).collect(),
            last_updated: videos.iter().map(|v| v.analyzed_at).max(),
        }
    }
}

/// Store for video transcript analyses
pub struct VideoStore {
    backend: Box<dyn RecordStore<VideoAnalysis>>,
}

impl VideoStore {
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

    pub async fn load(&self) -> LoadOutcome<VideoAnalysis> {
        self.backend.load().await
    }

    pub async fn get_all(&self) -> Vec<VideoAnalysis> {
        self.backend.get_all().await
    }

    pub async fn save(&self, analysis: VideoAnalysis) -> Result<VideoAnalysis, StoreError> {
        let saved = self.backend.save(analysis).await?;
        debug!("Stored video analysis {} for {}", saved.id, saved.channel_name);
        Ok(saved)
    }

    pub async fn latest(&self, limit: usize) -> Vec<VideoAnalysis> {
        newest(self.get_all().await, limit, |v| v.analyzed_at)
    }

    pub async fn by_channel(&self, channel: &str) -> Vec<VideoAnalysis> {
        self.filtered(|v| contains_ci(&v.channel_name, channel)).await
    }

    pub async fn by_video_id(&self, video_id: &str) -> Vec<VideoAnalysis> {
        self.filtered(|v| v.video_id == video_id).await
    }

    pub async fn by_token(&self, symbol: &str) -> Vec<VideoAnalysis> {
        self.filtered(|v| v.mentioned_tokens.iter().any(|t| eq_ci(&t.symbol, symbol)))
            .await
    }

    pub async fn by_sentiment(&self, sentiment: VideoSentiment) -> Vec<VideoAnalysis> {
        self.filtered(|v| v.sentiment.overall == sentiment).await
    }

    pub async fn by_narrative(&self, narrative: &str) -> Vec<VideoAnalysis> {
        self.filtered(|v| v.narratives.iter().any(|n| contains_ci(&n.name, narrative)))
            .await
    }

    pub async fn recent(&self, days: i64) -> Vec<VideoAnalysis> {
        self.recent_at(days, Utc::now()).await
    }

    pub async fn recent_at(&self, days: i64, now: DateTime<Utc>) -> Vec<VideoAnalysis> {
        self.filtered(|v| within_window(v.analyzed_at, days, now)).await
    }

    pub async fn stats(&self, window_days: i64) -> VideoStats {
        self.stats_at(window_days, Utc::now()).await
    }

    pub async fn stats_at(&self, window_days: i64, now: DateTime<Utc>) -> VideoStats {
        VideoStats::from_records(&self.get_all().await, window_days, now)
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<VideoAnalysis>
    where
        F: Fn(&VideoAnalysis) -> bool,
    {
        self.get_all().await.into_iter().filter(|v| predicate(v)).collect()
    }
}

//! On-chain tweets - protocol metrics surfaced on social media
//!
//! Unlike the other stores, saving a tweet replaces any stored tweet with the
//! same id or the same source URL (`fonte`), so re-ingesting a feed does not
//! duplicate entries.

use crate::filters::{contains_ci, eq_ci, newest};
use crate::sentiment::{parse_label, SentimentBreakdown, SentimentScale};
use chrono::{DateTime, Utc};
use common::{within_window, InMemoryStore, JsonFileStore, LoadOutcome, Ranked, Record, RecordStore, StoreError, Tally};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const TOP_PROTOCOLS: usize = 5;
const TOP_BLOCKCHAINS: usize = 5;
const TOP_NARRATIVES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweetSentiment {
    #[serde(rename = "positivo")]
    Positive,
    #[serde(rename = "negativo")]
    Negative,
    #[serde(rename = "neutro")]
    Neutral,
}

impl SentimentScale for TweetSentiment {
    const ALL: &'static [Self] = &[TweetSentiment::Positive, TweetSentiment::Negative, TweetSentiment::Neutral];

    fn label(&self) -> &'static str {
        match self {
            TweetSentiment::Positive => "positivo",
            TweetSentiment::Negative => "negativo",
            TweetSentiment::Neutral => "neutro",
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, TweetSentiment::Positive)
    }
}

impl FromStr for TweetSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s)
    }
}

impl fmt::Display for TweetSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(rename = "comentarios", default)]
    pub comments: u64,
}

impl Engagement {
    pub fn total(&self) -> u64 {
        self.likes.saturating_add(self.retweets).saturating_add(self.comments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainTweet {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "protocolo")]
    pub protocol: String,
    pub blockchain: String,
    #[serde(rename = "metrica_onchain", default)]
    pub metric: String,
    #[serde(rename = "narrativa", default)]
    pub narratives: Vec<String>,
    #[serde(rename = "sentimento")]
    pub sentiment: TweetSentiment,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "data")]
    pub posted_at: DateTime<Utc>,
    #[serde(rename = "engajamento", default)]
    pub engagement: Engagement,
    /// Source URL of the tweet, also the upsert key
    #[serde(rename = "fonte", default)]
    pub source_url: String,
}

impl Record for OnChainTweet {
    const DOMAIN: &'static str = "on-chain tweet";
    const ID_PREFIX: &'static str = "tweet";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn recency(&self) -> DateTime<Utc> {
        self.posted_at
    }

    fn same_entity(&self, other: &Self) -> bool {
        let same_id = !self.id.is_empty() && self.id == other.id;
        let same_source = !self.source_url.is_empty() && self.source_url == other.source_url;
        same_id || same_source
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainStats {
    pub total_tweets: usize,
    pub recent_tweets: usize,
    pub window_days: i64,
    pub sentiment: SentimentBreakdown,
    pub top_protocols: Vec<Ranked>,
    pub top_blockchains: Vec<Ranked>,
    pub top_narratives: Vec<Ranked>,
    /// Likes + retweets + comments over the recent window
    pub recent_engagement: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl OnChainStats {
    pub fn from_records(tweets: &[OnChainTweet], window_days: i64, now: DateTime<Utc>) -> Self {
        let recent: Vec<&OnChainTweet> = tweets
            .iter()
            .filter(|t| within_window(t.posted_at, window_days, now))
            .collect();

        let mut protocols = Tally::new();
        let mut blockchains = Tally::new();
        let mut narratives = Tally::new();
        for tweet in &recent {
            protocols.add(&tweet.protocol);
            blockchains.add(&tweet.blockchain);
            narratives.extend(tweet.narratives.iter().map(String::as_str));
        }

        Self {
            total_tweets: tweets.len(),
            recent_tweets: recent.len(),
            window_days,
            sentiment: SentimentBreakdown::tally(recent.iter().map(|t| t.sentiment)),
            top_protocols: protocols.top(TOP_PROTOCOLS).into_iter().map(Ranked::from).collect(),
            top_blockchains: blockchains.top(TOP_BLOCKCHAINS).into_iter().map(Ranked::from).collect(),
            top_narratives: narratives.top(TOP_NARRATIVES).into_iter().map(Ranked::from).collect(),
            recent_engagement: recent
                .iter()
                .fold(0u64, |sum, t| sum.saturating_add(t.engagement.total())),
            last_updated: tweets.iter().map(|t| t.posted_at).max(),
        }
    }
}

/// Store for on-chain tweets
pub struct OnChainStore {
    backend: Box<dyn RecordStore<OnChainTweet>>,
}

impl OnChainStore {
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

    pub async fn load(&self) -> LoadOutcome<OnChainTweet> {
        self.backend.load().await
    }

    pub async fn get_all(&self) -> Vec<OnChainTweet> {
        self.backend.get_all().await
    }

    /// Insert, or replace the tweet sharing this id or source URL
    pub async fn save(&self, tweet: OnChainTweet) -> Result<OnChainTweet, StoreError> {
        let saved = self.backend.save(tweet).await?;
        debug!("Stored on-chain tweet {} ({} on {})", saved.id, saved.protocol, saved.blockchain);
        Ok(saved)
    }

    pub async fn latest(&self, limit: usize) -> Vec<OnChainTweet> {
        newest(self.get_all().await, limit, |t| t.posted_at)
    }

    pub async fn by_protocol(&self, protocol: &str) -> Vec<OnChainTweet> {
        self.filtered(|t| eq_ci(&t.protocol, protocol)).await
    }

    pub async fn by_blockchain(&self, blockchain: &str) -> Vec<OnChainTweet> {
        self.filtered(|t| eq_ci(&t.blockchain, blockchain)).await
    }

    pub async fn by_sentiment(&self, sentiment: TweetSentiment) -> Vec<OnChainTweet> {
        self.filtered(|t| t.sentiment == sentiment).await
    }

    pub async fn by_narrative(&self, narrative: &str) -> Vec<OnChainTweet> {
        self.filtered(|t| t.narratives.iter().any(|n| contains_ci(n, narrative))).await
    }

    pub async fn by_author(&self, author: &str) -> Vec<OnChainTweet> {
        let author = author.trim().trim_start_matches('@');
        self.filtered(|t| eq_ci(t.author.trim_start_matches('@'), author)).await
    }

    pub async fn recent(&self, days: i64) -> Vec<OnChainTweet> {
        self.recent_at(days, Utc::now()).await
    }

    pub async fn recent_at(&self, days: i64, now: DateTime<Utc>) -> Vec<OnChainTweet> {
        self.filtered(|t| within_window(t.posted_at, days, now)).await
    }

    /// The `limit` tweets with the highest total engagement
    pub async fn top_engaged(&self, limit: usize) -> Vec<OnChainTweet> {
        let mut tweets = self.get_all().await;
        tweets.sort_by(|a, b| b.engagement.total().cmp(&a.engagement.total()));
        tweets.truncate(limit);
        tweets
    }

    pub async fn stats(&self, window_days: i64) -> OnChainStats {
        self.stats_at(window_days, Utc::now()).await
    }

    pub async fn stats_at(&self, window_days: i64, now: DateTime<Utc>) -> OnChainStats {
        OnChainStats::from_records(&self.get_all().await, window_days, now)
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<OnChainTweet>
    where
        F: Fn(&OnChainTweet) -> bool,
    {
        self.get_all().await.into_iter().filter(|t| predicate(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn tweet(protocol: &str, chain: &str, source: &str, likes: u64, hours_ago: i64) -> OnChainTweet {
        OnChainTweet {
            id: String::new(),
            protocol: protocol.to_string(),
            blockchain: chain.to_string(),
            metric: "TVL up 12% WoW".to_string(),
            narratives: vec!["Restaking".to_string()],
            sentiment: TweetSentiment::Positive,
            author: "@onchainwizard".to_string(),
            posted_at: now() - Duration::hours(hours_ago),
            engagement: Engagement {
                likes,
                retweets: 3,
                comments: 1,
            },
            source_url: source.to_string(),
        }
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(tweet("EigenLayer", "Ethereum", "https://x.com/a/1", 10, 1)).unwrap();
        assert_eq!(value["protocolo"], "EigenLayer");
        assert_eq!(value["sentimento"], "positivo");
        assert_eq!(value["engajamento"]["comentarios"], 1);
        assert_eq!(value["fonte"], "https://x.com/a/1");
    }

    #[tokio::test]
    async fn test_same_source_is_upserted() {
        let dir = TempDir::new().unwrap();
        let store = OnChainStore::open(dir.path().join("onchain_tweets.json"), 500);

        let first = store.save(tweet("EigenLayer", "Ethereum", "https://x.com/a/1", 10, 2)).await.unwrap();
        let mut update = tweet("EigenLayer", "Ethereum", "https://x.com/a/1", 250, 2);
        update.sentiment = TweetSentiment::Negative;
        let second = store.save(update).await.unwrap();

        let all = store.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(all[0].engagement.likes, 250);
        assert_eq!(all[0].sentiment, TweetSentiment::Negative);
    }

    #[tokio::test]
    async fn test_same_id_is_upserted() {
        let store = OnChainStore::in_memory(500);
        let first = store.save(tweet("Jito", "Solana", "https://x.com/a/2", 5, 1)).await.unwrap();

        let mut moved = tweet("Jito", "Solana", "https://x.com/a/2-edited", 9, 1);
        moved.id = first.id.clone();
        store.save(moved).await.unwrap();

        let all = store.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].source_url, "https://x.com/a/2-edited");
    }

    #[tokio::test]
    async fn test_filters_and_engagement() {
        let store = OnChainStore::in_memory(500);
        store.save(tweet("EigenLayer", "Ethereum", "https://x.com/a/1", 10, 1)).await.unwrap();
        store.save(tweet("Jito", "Solana", "https://x.com/a/2", 400, 5)).await.unwrap();
        let mut old = tweet("Aave", "ethereum", "https://x.com/a/3", 50, 24 * 10);
        old.narratives = vec!["DeFi lending".to_string()];
        old.sentiment = TweetSentiment::Neutral;
        store.save(old).await.unwrap();

        assert_eq!(store.by_protocol("jito").await.len(), 1);
        assert_eq!(store.by_blockchain("Ethereum").await.len(), 2);
        assert_eq!(store.by_sentiment(TweetSentiment::Neutral).await.len(), 1);
        assert_eq!(store.by_narrative("lending").await.len(), 1);
        assert_eq!(store.by_author("OnChainWizard").await.len(), 3);
        assert_eq!(store.recent_at(7, now()).await.len(), 2);
        assert_eq!(store.top_engaged(1).await[0].protocol, "Jito");

        let stats = store.stats_at(7, now()).await;
        assert_eq!(stats.total_tweets, 3);
        assert_eq!(stats.recent_tweets, 2);
        assert_eq!(stats.recent_engagement, 10 + 4 + 400 + 4);
        assert_eq!(stats.top_narratives[0], Ranked { key: "Restaking".to_string(), count: 2 });
        assert_eq!(stats.sentiment.count("positivo"), 2);
        assert_eq!(stats.last_updated, Some(now() - Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let stats = OnChainStore::in_memory(500).stats(7).await;
        assert_eq!(stats.total_tweets, 0);
        assert_eq!(stats.recent_engagement, 0);
        assert_eq!(stats.sentiment.dominant_percentage, 0);
        assert!(stats.top_protocols.is_empty());
        assert_eq!(stats.last_updated, None);
    }

    #[tokio::test]
    async fn test_huge_engagement_saturates() {
        let store = OnChainStore::in_memory(500);
        store.save(tweet("Jito", "Solana", "https://x.com/a/9", u64::MAX, 1)).await.unwrap();
        store.save(tweet("Aave", "Ethereum", "https://x.com/a/8", u64::MAX, 2)).await.unwrap();

        assert_eq!(store.top_engaged(1).await[0].engagement.total(), u64::MAX);
        assert_eq!(store.stats_at(7, now()).await.recent_engagement, u64::MAX);
    }

    #[tokio::test]
    async fn test_update_matching_two_tweets_replaces_both() {
        let store = OnChainStore::in_memory(500);
        let first = store.save(tweet("EigenLayer", "Ethereum", "https://x.com/a/1", 10, 3)).await.unwrap();
        store.save(tweet("Jito", "Solana", "https://x.com/a/2", 20, 2)).await.unwrap();

        let mut merged = tweet("EigenLayer", "Ethereum", "https://x.com/a/2", 30, 1);
        merged.id = first.id.clone();
        let stored = store.save(merged).await.unwrap();

        let all = store.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(stored.id, first.id);
        assert_eq!(all[0].source_url, "https://x.com/a/2");
    }
}

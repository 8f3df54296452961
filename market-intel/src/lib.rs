//! Market Intelligence Stores
//!
//! Flat-file backed stores for the four research domains shown on the
//! dashboard:
//! - News articles with macro impact and related assets
//! - Macro analyses (market-wide sentiment and cycle phase)
//! - On-chain tweets (protocol metrics, upserted by source URL)
//! - Video transcript analyses (narratives and token mentions per video)
//!
//! Each store offers the same core contract (initialize / get_all / save)
//! plus read-only filters and a stats view over a recency window.

mod filters;
pub mod macro_analysis;
pub mod news;
pub mod onchain;
pub mod sentiment;
pub mod video;

pub use macro_analysis::{MacroAnalysis, MacroAnalysisStats, MacroAnalysisStore, MacroSentiment, MarketPhase};
pub use news::{CyclePhase, MacroImpact, NewsRecord, NewsSentiment, NewsStats, NewsStore, Severity};
pub use onchain::{Engagement, OnChainStats, OnChainStore, OnChainTweet, TweetSentiment};
pub use sentiment::{parse_label, SentimentBreakdown, SentimentBucket, SentimentScale};
pub use video::{
    NarrativeStrength, NarrativeSummary, SentimentAssessment, TokenMention, TokenSentiment, TokenSummary,
    VideoAnalysis, VideoNarrative, VideoSentiment, VideoStats, VideoStore,
};

use common::{DashboardConfig, WindowConfig};
use tracing::info;

/// All four domain stores opened against one data directory
pub struct IntelStores {
    pub news: NewsStore,
    pub macro_analysis: MacroAnalysisStore,
    pub onchain: OnChainStore,
    pub video: VideoStore,
    windows: WindowConfig,
}

impl IntelStores {
    /// Open file-backed stores as described by the configuration
    pub fn open(config: &DashboardConfig) -> Self {
        Self {
            news: NewsStore::open(config.news_path(), config.retention.news),
            macro_analysis: MacroAnalysisStore::open(config.macro_analysis_path(), config.retention.macro_analysis),
            onchain: OnChainStore::open(config.onchain_path(), config.retention.onchain),
            video: VideoStore::open(config.video_path(), config.retention.video),
            windows: config.windows.clone(),
        }
    }

    /// Initialize every store. Failures are logged and the stores behave as
    /// empty until a save succeeds.
    pub async fn initialize(&self) {
        self.news.initialize().await;
        self.macro_analysis.initialize().await;
        self.onchain.initialize().await;
        self.video.initialize().await;
        info!("Market intelligence stores initialized");
    }

    /// Configured stats windows
    pub fn windows(&self) -> &WindowConfig {
        &self.windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_and_initialize_creates_all_files() {
        let dir = TempDir::new().unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().join("data"),
            ..Default::default()
        };

        let stores = IntelStores::open(&config);
        stores.initialize().await;

        for path in [
            config.news_path(),
            config.macro_analysis_path(),
            config.onchain_path(),
            config.video_path(),
        ] {
            assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
        }
        assert_eq!(stores.windows().video, 30);
        assert!(stores.macro_analysis.get_all().await.is_empty());
    }
}

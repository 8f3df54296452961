//! Example usage of the cross-agent export
//!
//! This example demonstrates:
//! 1. Opening the four stores in a scratch data directory
//! 2. Saving a few video analyses
//! 3. Reading the stats view
//! 4. Exporting the recent analyses to the macro agent

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{logging, DashboardConfig};
use market_intel::{
    IntelStores, NarrativeStrength, SentimentAssessment, TokenMention, TokenSentiment, VideoAnalysis, VideoNarrative,
    VideoSentiment,
};
use research_agents::{export_recent, AgentKind, Exporter};
use tracing::info;

fn sample(video_id: &str, channel: &str, overall: VideoSentiment, token: &str, hours_ago: i64) -> VideoAnalysis {
    let analyzed_at = Utc::now() - Duration::hours(hours_ago);
    VideoAnalysis {
        id: String::new(),
        video_id: video_id.to_string(),
        video_title: format!("{} market update", channel),
        channel_name: channel.to_string(),
        channel_url: String::new(),
        published_at: analyzed_at - Duration::hours(4),
        analyzed_at,
        sentiment: SentimentAssessment {
            overall,
            strength: 7.0,
            description: String::new(),
        },
        narratives: vec![VideoNarrative {
            name: "AI agents".to_string(),
            strength: NarrativeStrength::Strong,
            timeframe: "short-term".to_string(),
        }],
        mentioned_tokens: vec![TokenMention {
            symbol: token.to_string(),
            sentiment: TokenSentiment::Positive,
        }],
        macro_signals: vec!["Rate cuts expected".to_string()],
        perceived_risks: vec![],
        opportunities: vec![],
        summary: String::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("info");

    info!("Research Agents - Export Example");
    info!("================================");

    // Step 1: Open stores in a scratch directory
    let config = DashboardConfig {
        data_dir: std::env::temp_dir().join("dashboard-export-demo"),
        ..Default::default()
    };
    let stores = IntelStores::open(&config);
    stores.initialize().await;

    // Step 2: Save analyses
    stores.video.save(sample("a1", "Coin Bureau", VideoSentiment::Bullish, "SOL", 2)).await?;
    stores.video.save(sample("b2", "Benjamin Cowen", VideoSentiment::Bearish, "BTC", 5)).await?;
    stores.video.save(sample("c3", "Coin Bureau", VideoSentiment::Bullish, "SOL", 30)).await?;

    // Step 3: Stats
    let stats = stores.video.stats(config.windows.video).await;
    info!("Videos: {} ({} recent)", stats.total_videos, stats.recent_videos);
    for token in &stats.top_tokens {
        info!("  {}: {} mentions, {}% positive", token.symbol, token.mentions, token.positive_percentage);
    }

    // Step 4: Export to the macro agent
    let exporter = Exporter::new(config.export.clone());
    let bundle = export_recent(&stores, &exporter, AgentKind::Video, AgentKind::Macro, 7).await;
    for insight in &bundle.insights {
        info!("Insight: {}", insight);
    }
    println!("{}", serde_json::to_string_pretty(&bundle)?);

    Ok(())
}

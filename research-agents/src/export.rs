//! Cross-agent export
//!
//! Turns a filtered record sequence from one domain into an `ExportBundle`
//! addressed to another agent.

use crate::agent::{AgentEnvelope, AgentKind, EnvelopeMetadata, EnvelopeSource, ExportBundle};
use crate::insights::{generate_insights, InsightBuilder, InsightInput};
use chrono::{DateTime, Utc};
use common::ExportConfig;
use market_intel::{
    IntelStores, MacroAnalysis, NewsRecord, OnChainTweet, SentimentBreakdown, SentimentScale, VideoAnalysis,
};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

/// A record kind that can travel between agents
pub trait Exportable {
    const AGENT: AgentKind;

    fn source(&self) -> EnvelopeSource;

    /// Domain payload, without the provenance fields carried by `source`
    fn content(&self) -> serde_json::Value;

    fn insight_input(records: &[Self]) -> InsightInput
    where
        Self: Sized;
}

impl Exportable for NewsRecord {
    const AGENT: AgentKind = AgentKind::News;

    fn source(&self) -> EnvelopeSource {
        EnvelopeSource {
            agent: Self::AGENT,
            record_id: self.id.clone(),
            origin: self.url.clone(),
            author: Some(self.source.clone()),
            published_at: self.timestamp,
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "title": self.title,
            "content": self.content,
            "categories": self.categories,
            "macroImpact": self.macro_impact,
            "regulatoryImplications": self.regulatory_implications,
            "relatedAssets": self.related_assets,
            "marketCycle": self.market_cycle,
            "investmentSignal": self.investment_signal,
        })
    }

    fn insight_input(records: &[Self]) -> InsightInput {
        let sentiment = SentimentBreakdown::tally(records.iter().map(|r| r.macro_impact.sentiment));
        let mut builder = InsightBuilder::new(records.len(), sentiment);
        for record in records {
            let positive = record.macro_impact.sentiment.is_positive();
            for asset in &record.related_assets {
                builder.token(asset, positive);
            }
            for category in &record.categories {
                builder.narrative(category, None);
            }
        }
        builder.build()
    }
}

impl Exportable for MacroAnalysis {
    const AGENT: AgentKind = AgentKind::Macro;

    fn source(&self) -> EnvelopeSource {
        EnvelopeSource {
            agent: Self::AGENT,
            record_id: self.id.clone(),
            origin: String::new(),
            author: None,
            published_at: self.timestamp,
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "sentimento_geral": self.sentiment,
            "sinais_macro": self.macro_signals,
            "narrativas_emergentes": self.emerging_narratives,
            "tokens_mencionados": self.mentioned_tokens,
            "fase_ciclo_mercado": self.market_phase,
            "justificativa": self.rationale,
        })
    }

    fn insight_input(records: &[Self]) -> InsightInput {
        let sentiment = SentimentBreakdown::tally(records.iter().map(|r| r.sentiment));
        let mut builder = InsightBuilder::new(records.len(), sentiment);
        for record in records {
            let positive = record.sentiment.is_positive();
            for token in &record.mentioned_tokens {
                builder.token(token, positive);
            }
            for narrative in &record.emerging_narratives {
                builder.narrative(narrative, None);
            }
        }
        builder.build()
    }
}

impl Exportable for OnChainTweet {
    const AGENT: AgentKind = AgentKind::Onchain;

    fn source(&self) -> EnvelopeSource {
        EnvelopeSource {
            agent: Self::AGENT,
            record_id: self.id.clone(),
            origin: self.source_url.clone(),
            author: Some(self.author.clone()),
            published_at: self.posted_at,
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "protocolo": self.protocol,
            "blockchain": self.blockchain,
            "metrica_onchain": self.metric,
            "narrativa": self.narratives,
            "sentimento": self.sentiment,
            "engajamento": self.engagement,
        })
    }

    fn insight_input(records: &[Self]) -> InsightInput {
        let sentiment = SentimentBreakdown::tally(records.iter().map(|r| r.sentiment));
        let mut builder = InsightBuilder::new(records.len(), sentiment);
        for record in records {
            builder.token(&record.protocol, record.sentiment.is_positive());
            for narrative in &record.narratives {
                builder.narrative(narrative, None);
            }
        }
        builder.build()
    }
}

impl Exportable for VideoAnalysis {
    const AGENT: AgentKind = AgentKind::Video;

    fn source(&self) -> EnvelopeSource {
        EnvelopeSource {
            agent: Self::AGENT,
            record_id: self.id.clone(),
            origin: format!("https://www.youtube.com/watch?v={}", self.video_id),
            author: Some(self.channel_name.clone()),
            published_at: self.published_at,
        }
    }

    fn content(&self) -> serde_json::Value {
        json!({
            "videoTitle": self.video_title,
            "channelUrl": self.channel_url,
            "analyzedAt": self.analyzed_at,
            "sentiment": self.sentiment,
            "narratives": self.narratives,
            "mentionedTokens": self.mentioned_tokens,
            "macroSignals": self.macro_signals,
            "perceivedRisks": self.perceived_risks,
            "opportunities": self.opportunities,
            "summary": self.summary,
        })
    }

    fn insight_input(records: &[Self]) -> InsightInput {
        let sentiment = SentimentBreakdown::tally(records.iter().map(|r| r.sentiment.overall));
        let mut builder = InsightBuilder::new(records.len(), sentiment);
        for record in records {
            for mention in &record.mentioned_tokens {
                builder.token(&mention.symbol, mention.sentiment.is_positive());
            }
            for narrative in &record.narratives {
                builder.narrative(&narrative.name, Some(narrative.strength));
            }
        }
        builder.build()
    }
}

/// Builds export bundles with the configured placeholder scores
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn export<R: Exportable>(&self, records: &[R], to: AgentKind) -> ExportBundle {
        self.export_at(records, to, Utc::now())
    }

    pub fn export_at<R: Exportable>(&self, records: &[R], to: AgentKind, now: DateTime<Utc>) -> ExportBundle {
        let envelopes: Vec<AgentEnvelope> = records
            .iter()
            .map(|record| AgentEnvelope {
                source: record.source(),
                content: record.content(),
                metadata: EnvelopeMetadata {
                    confidence: self.config.confidence,
                    relevance: self.config.relevance,
                    exported_at: now,
                },
            })
            .collect();

        let insights = generate_insights(&R::insight_input(records));
        debug!(
            "Built {} envelopes and {} insights for {} -> {}",
            envelopes.len(),
            insights.len(),
            R::AGENT,
            to
        );

        ExportBundle {
            id: Uuid::new_v4(),
            from: R::AGENT,
            to,
            exported_at: now,
            records: envelopes,
            insights,
        }
    }
}

/// Export the last `days` days of one agent's records to another agent
pub async fn export_recent(
    stores: &IntelStores,
    exporter: &Exporter,
    from: AgentKind,
    to: AgentKind,
    days: i64,
) -> ExportBundle {
    let bundle = match from {
        AgentKind::News => exporter.export(&stores.news.recent(days).await, to),
        AgentKind::Macro => exporter.export(&stores.macro_analysis.by_period(days).await, to),
        AgentKind::Onchain => exporter.export(&stores.onchain.recent(days).await, to),
        AgentKind::Video => exporter.export(&stores.video.recent(days).await, to),
    };
    info!(
        "Exported {} {} records to {} ({} insights)",
        bundle.records.len(),
        from,
        to,
        bundle.insights.len()
    );
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::DashboardConfig;
    use market_intel::{
        Engagement, MacroSentiment, MarketPhase, NarrativeStrength, SentimentAssessment, TokenMention,
        TokenSentiment, TweetSentiment, VideoNarrative, VideoSentiment, VideoStats,
    };
    use tempfile::TempDir;

    fn video(id: &str, overall: VideoSentiment, analyzed_at: DateTime<Utc>) -> VideoAnalysis {
        VideoAnalysis {
            id: id.to_string(),
            video_id: format!("vid-{}", id),
            video_title: "Weekly outlook".to_string(),
            channel_name: "Coin Bureau".to_string(),
            channel_url: "https://youtube.example/@coinbureau".to_string(),
            published_at: analyzed_at - Duration::hours(2),
            analyzed_at,
            sentiment: SentimentAssessment {
                overall,
                strength: 6.5,
                description: "Constructive".to_string(),
            },
            narratives: vec![VideoNarrative {
                name: "AI agents".to_string(),
                strength: NarrativeStrength::Strong,
                timeframe: "weeks".to_string(),
            }],
            mentioned_tokens: vec![TokenMention {
                symbol: "SOL".to_string(),
                sentiment: TokenSentiment::Positive,
            }],
            macro_signals: vec![],
            perceived_risks: vec![],
            opportunities: vec![],
            summary: "SOL strength".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_export_video_to_macro() {
        let exporter = Exporter::new(ExportConfig::default());
        let records = vec![
            video("v1", VideoSentiment::Bullish, now()),
            video("v2", VideoSentiment::Bullish, now()),
            video("v3", VideoSentiment::Bearish, now()),
        ];

        let bundle = exporter.export_at(&records, AgentKind::Macro, now());
        assert_eq!(bundle.from, AgentKind::Video);
        assert_eq!(bundle.to, AgentKind::Macro);
        assert_eq!(bundle.records.len(), 3);

        let first = &bundle.records[0];
        assert_eq!(first.source.record_id, "v1");
        assert_eq!(first.source.author.as_deref(), Some("Coin Bureau"));
        assert!(first.source.origin.ends_with("vid-v1"));
        assert_eq!(first.content["summary"], "SOL strength");
        assert_eq!(first.metadata.confidence, 0.8);
        assert_eq!(first.metadata.exported_at, now());

        assert_eq!(
            bundle.insights,
            vec![
                "Bullish sentiment dominates with 67% of analyzed items".to_string(),
                "Most discussed tokens: SOL. SOL has 100% positive sentiment".to_string(),
                "Top narratives: AI agents. AI agents appears to be strong".to_string(),
            ]
        );
    }

    #[test]
    fn test_video_insight_strength_matches_stats() {
        let mut weak = video("v1", VideoSentiment::Bullish, now());
        weak.narratives[0].strength = NarrativeStrength::Weak;
        let strong = video("v2", VideoSentiment::Bullish, now() - Duration::days(1));
        let records = vec![weak, strong];

        let stats = VideoStats::from_records(&records, 30, now());
        assert_eq!(stats.top_narratives[0].dominant_strength, Some(NarrativeStrength::Strong));

        let bundle = Exporter::default().export_at(&records, AgentKind::Macro, now());
        assert_eq!(bundle.insights[2], "Top narratives: AI agents. AI agents appears to be strong");
    }

    #[test]
    fn test_export_empty_sequence() {
        let exporter = Exporter::default();
        let bundle = exporter.export(&Vec::<OnChainTweet>::new(), AgentKind::News);
        assert!(bundle.records.is_empty());
        assert!(bundle.insights.is_empty());
    }

    #[test]
    fn test_macro_insights_use_bullish_share() {
        let analysis = |sentiment| MacroAnalysis {
            id: String::new(),
            timestamp: now(),
            sentiment,
            macro_signals: String::new(),
            emerging_narratives: vec!["Bitcoin ETFs".to_string()],
            mentioned_tokens: vec!["BTC".to_string()],
            market_phase: MarketPhase::Accumulation,
            rationale: String::new(),
        };
        let records = vec![
            analysis(MacroSentiment::Bullish),
            analysis(MacroSentiment::Bearish),
            analysis(MacroSentiment::Bearish),
            analysis(MacroSentiment::Bullish),
        ];

        let insights = generate_insights(&MacroAnalysis::insight_input(&records));
        assert_eq!(insights[0], "Bullish sentiment dominates with 50% of analyzed items");
        assert_eq!(insights[1], "Most discussed tokens: BTC. BTC has 50% positive sentiment");
        assert_eq!(insights[2], "Top narratives: Bitcoin ETFs");
    }

    #[tokio::test]
    async fn test_export_recent_from_stores() {
        let dir = TempDir::new().unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let stores = IntelStores::open(&config);
        stores.initialize().await;

        stores
            .onchain
            .save(OnChainTweet {
                id: String::new(),
                protocol: "EigenLayer".to_string(),
                blockchain: "Ethereum".to_string(),
                metric: "TVL $15B".to_string(),
                narratives: vec!["Restaking".to_string()],
                sentiment: TweetSentiment::Positive,
                author: "@analyst".to_string(),
                posted_at: Utc::now() - Duration::hours(3),
                engagement: Engagement::default(),
                source_url: "https://x.com/analyst/1".to_string(),
            })
            .await
            .unwrap();

        let exporter = Exporter::new(config.export.clone());
        let bundle = export_recent(&stores, &exporter, AgentKind::Onchain, AgentKind::Macro, 7).await;
        assert_eq!(bundle.records.len(), 1);
        assert_eq!(bundle.records[0].source.origin, "https://x.com/analyst/1");
        assert_eq!(bundle.records[0].content["protocolo"], "EigenLayer");
        assert_eq!(bundle.insights[0], "Positivo sentiment dominates with 100% of analyzed items");

        let empty = export_recent(&stores, &exporter, AgentKind::Video, AgentKind::Macro, 7).await;
        assert!(empty.records.is_empty());
        assert!(empty.insights.is_empty());
    }
}

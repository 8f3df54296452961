//! Command handlers. Each returns the JSON document the CLI prints.

use crate::{FilterArgs, ListArgs};
use anyhow::{bail, Context, Result};
use common::DashboardConfig;
use market_intel::{IntelStores, MacroAnalysis, NewsRecord, OnChainTweet, VideoAnalysis};
use research_agents::{export_recent, AgentKind, Exporter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

fn read_records<R: DeserializeOwned>(file: &Path) -> Result<Vec<R>> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let records = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of records", file.display()))?;
    Ok(records)
}

/// Save every record of `file`; stops at the first write failure
pub async fn ingest(stores: &IntelStores, domain: AgentKind, file: &Path) -> Result<usize> {
    let saved = match domain {
        AgentKind::News => {
            let records: Vec<NewsRecord> = read_records(file)?;
            let count = records.len();
            for record in records {
                stores.news.save(record).await?;
            }
            count
        }
        AgentKind::Macro => {
            let records: Vec<MacroAnalysis> = read_records(file)?;
            let count = records.len();
            for record in records {
                stores.macro_analysis.save(record).await?;
            }
            count
        }
        AgentKind::Onchain => {
            let records: Vec<OnChainTweet> = read_records(file)?;
            let count = records.len();
            for record in records {
                stores.onchain.save(record).await?;
            }
            count
        }
        AgentKind::Video => {
            let records: Vec<VideoAnalysis> = read_records(file)?;
            let count = records.len();
            for record in records {
                stores.video.save(record).await?;
            }
            count
        }
    };
    info!("Ingested {} {} records from {}", saved, domain, file.display());
    Ok(saved)
}

fn limited<T: Serialize>(mut records: Vec<T>, limit: usize) -> Result<serde_json::Value> {
    records.truncate(limit);
    Ok(serde_json::to_value(records)?)
}

fn unsupported(flag: &str, domain: AgentKind) -> anyhow::Error {
    anyhow::anyhow!("--{} is not supported for {} records", flag, domain)
}

pub async fn list(stores: &IntelStores, args: &ListArgs) -> Result<serde_json::Value> {
    let FilterArgs {
        sentiment,
        token,
        category,
        narrative,
        channel,
        days,
    } = &args.filter;
    let limit = args.limit;

    match args.domain {
        AgentKind::News => {
            let store = &stores.news;
            let records = if let Some(s) = sentiment {
                store.by_sentiment(s.parse().map_err(anyhow::Error::msg)?).await
            } else if let Some(t) = token {
                store.by_asset(t).await
            } else if let Some(c) = category {
                store.by_category(c).await
            } else if let Some(n) = narrative {
                store.search(n).await
            } else if channel.is_some() {
                return Err(unsupported("channel", args.domain));
            } else if let Some(d) = days {
                store.recent(*d).await
            } else {
                store.latest(limit).await
            };
            limited(records, limit)
        }
        AgentKind::Macro => {
            let store = &stores.macro_analysis;
            let records = if let Some(s) = sentiment {
                store.by_sentiment(s.parse().map_err(anyhow::Error::msg)?).await
            } else if let Some(t) = token {
                store.by_token(t).await
            } else if let Some(c) = category {
                store.by_phase(c.parse().map_err(anyhow::Error::msg)?).await
            } else if let Some(n) = narrative {
                store.by_narrative(n).await
            } else if channel.is_some() {
                return Err(unsupported("channel", args.domain));
            } else if let Some(d) = days {
                store.by_period(*d).await
            } else {
                store.latest(limit).await
            };
            limited(records, limit)
        }
        AgentKind::Onchain => {
            let store = &stores.onchain;
            let records = if let Some(s) = sentiment {
                store.by_sentiment(s.parse().map_err(anyhow::Error::msg)?).await
            } else if let Some(t) = token {
                store.by_protocol(t).await
            } else if let Some(c) = category {
                store.by_blockchain(c).await
            } else if let Some(n) = narrative {
                store.by_narrative(n).await
            } else if let Some(a) = channel {
                store.by_author(a).await
            } else if let Some(d) = days {
                store.recent(*d).await
            } else {
                store.latest(limit).await
            };
            limited(records, limit)
        }
        AgentKind::Video => {
            let store = &stores.video;
            let records = if let Some(s) = sentiment {
                store.by_sentiment(s.parse().map_err(anyhow::Error::msg)?).await
            } else if let Some(t) = token {
                store.by_token(t).await
            } else if category.is_some() {
                return Err(unsupported("category", args.domain));
            } else if let Some(n) = narrative {
                store.by_narrative(n).await
            } else if let Some(c) = channel {
                store.by_channel(c).await
            } else if let Some(d) = days {
                store.recent(*d).await
            } else {
                store.latest(limit).await
            };
            limited(records, limit)
        }
    }
}

pub async fn stats(stores: &IntelStores, domain: AgentKind, days: Option<i64>) -> Result<serde_json::Value> {
    let windows = stores.windows();
    let value = match domain {
        AgentKind::News => serde_json::to_value(stores.news.stats(days.unwrap_or(windows.news)).await)?,
        AgentKind::Macro => serde_json::to_value(
            stores
                .macro_analysis
                .analysis_stats(days.unwrap_or(windows.macro_analysis))
                .await,
        )?,
        AgentKind::Onchain => serde_json::to_value(stores.onchain.stats(days.unwrap_or(windows.onchain)).await)?,
        AgentKind::Video => serde_json::to_value(stores.video.stats(days.unwrap_or(windows.video)).await)?,
    };
    Ok(value)
}

pub async fn export(
    stores: &IntelStores,
    config: &DashboardConfig,
    from: AgentKind,
    to: AgentKind,
    days: i64,
) -> Result<serde_json::Value> {
    if from == to {
        bail!("cannot export {} records to the same agent", from);
    }
    let exporter = Exporter::new(config.export.clone());
    let bundle = export_recent(stores, &exporter, from, to, days).await;
    Ok(serde_json::to_value(bundle)?)
}

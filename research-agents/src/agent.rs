//! Agent identities and the export envelope format
//!
//! Every exported record travels as an `AgentEnvelope`: where it came from
//! (`source`), the domain payload (`content`) and scoring metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The research agents that exchange records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    News,
    Macro,
    Onchain,
    Video,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [AgentKind::News, AgentKind::Macro, AgentKind::Onchain, AgentKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::News => "news",
            AgentKind::Macro => "macro",
            AgentKind::Onchain => "onchain",
            AgentKind::Video => "video",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown agent '{}', expected news, macro, onchain or video", s))
    }
}

/// Identity and provenance of an exported record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSource {
    pub agent: AgentKind,
    pub record_id: String,
    /// URL (or channel URL) the record was derived from
    pub origin: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Placeholder scores, identical for every envelope of an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub confidence: f64, // 0.0 to 1.0
    pub relevance: f64,  // 0.0 to 1.0
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEnvelope {
    pub source: EnvelopeSource,
    pub content: serde_json::Value,
    pub metadata: EnvelopeMetadata,
}

/// Records handed from one agent to another, plus derived insights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    pub id: Uuid,
    pub from: AgentKind,
    pub to: AgentKind,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<AgentEnvelope>,
    pub insights: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_parsing() {
        assert_eq!("Video".parse::<AgentKind>(), Ok(AgentKind::Video));
        assert!("twitter".parse::<AgentKind>().is_err());
        assert_eq!(serde_json::to_value(AgentKind::Onchain).unwrap(), "onchain");
    }
}

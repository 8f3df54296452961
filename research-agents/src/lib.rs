//! Research Agents - cross-agent export
//!
//! Each research domain (news, macro, on-chain, video) acts as an agent. This
//! crate reshapes one agent's records into normalized envelopes another agent
//! can consume, and derives short human-readable insights from the
//! aggregated counts.

pub mod agent;
pub mod export;
pub mod insights;

// Re-export commonly used types
pub use agent::{AgentEnvelope, AgentKind, EnvelopeMetadata, EnvelopeSource, ExportBundle};
pub use export::{export_recent, Exportable, Exporter};
pub use insights::{generate_insights, InsightBuilder, InsightInput, NarrativeInsight, TokenInsight};

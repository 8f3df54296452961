//! Natural-language insights derived from aggregated counts

use common::{dominant, percentage, Tally};
use market_intel::{NarrativeStrength, SentimentBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOP_TOKENS: usize = 3;
const TOP_NARRATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInsight {
    pub symbol: String,
    pub mentions: usize,
    pub positive_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeInsight {
    pub name: String,
    pub mentions: usize,
    pub strength: Option<String>,
}

/// Aggregated counts an insight list is generated from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightInput {
    pub total: usize,
    pub sentiment: SentimentBreakdown,
    pub tokens: Vec<TokenInsight>,
    pub narratives: Vec<NarrativeInsight>,
}

/// Accumulates token and narrative mentions for an `InsightInput`
#[derive(Debug, Default)]
pub struct InsightBuilder {
    total: usize,
    sentiment: SentimentBreakdown,
    tokens: Tally,
    token_positive: HashMap<String, usize>,
    narratives: Tally,
    narrative_strength: HashMap<String, [usize; 3]>,
}

impl InsightBuilder {
    pub fn new(total: usize, sentiment: SentimentBreakdown) -> Self {
        Self {
            total,
            sentiment,
            ..Default::default()
        }
    }

    /// Count one mention of `symbol`, tagged positive or not
    pub fn token(&mut self, symbol: &str, positive: bool) {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return;
        }
        self.tokens.add(&symbol);
        if positive {
            *self.token_positive.entry(symbol).or_insert(0) += 1;
        }
    }

    /// Count one mention of a narrative, with its perceived strength if known
    pub fn narrative(&mut self, name: &str, strength: Option<NarrativeStrength>) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.narratives.add(name);
        if let Some(strength) = strength {
            if let Some(slot) = NarrativeStrength::ALL.iter().position(|s| *s == strength) {
                self.narrative_strength.entry(name.to_string()).or_default()[slot] += 1;
            }
        }
    }

    pub fn build(self) -> InsightInput {
        let tokens = self
            .tokens
            .top(TOP_TOKENS)
            .into_iter()
            .map(|(symbol, mentions)| TokenInsight {
                positive_percentage: percentage(self.token_positive.get(&symbol).copied().unwrap_or(0), mentions),
                symbol,
                mentions,
            })
            .collect();

        let narratives = self
            .narratives
            .top(TOP_NARRATIVES)
            .into_iter()
            .map(|(name, mentions)| NarrativeInsight {
                // Same tie-break as the video stats: strongest declared value wins
                strength: self.narrative_strength.get(&name).and_then(|counts| {
                    let buckets: Vec<(NarrativeStrength, usize)> =
                        NarrativeStrength::ALL.iter().copied().zip(*counts).collect();
                    dominant(&buckets).map(|(s, _)| s.label().to_string())
                }),
                name,
                mentions,
            })
            .collect();

        InsightInput {
            total: self.total,
            sentiment: self.sentiment,
            tokens,
            narratives,
        }
    }
}

/// Build insight sentences. An input with no items yields no insights.
pub fn generate_insights(input: &InsightInput) -> Vec<String> {
    let mut insights = Vec::new();
    if input.total == 0 {
        return insights;
    }

    if let Some(dominant) = &input.sentiment.dominant {
        insights.push(format!(
            "{} sentiment dominates with {}% of analyzed items",
            capitalize(dominant),
            input.sentiment.dominant_percentage
        ));
    }

    if let Some(top) = input.tokens.first() {
        let list: Vec<&str> = input.tokens.iter().map(|t| t.symbol.as_str()).collect();
        insights.push(format!(
            "Most discussed tokens: {}. {} has {}% positive sentiment",
            list.join(", "),
            top.symbol,
            top.positive_percentage
        ));
    }

    if let Some(top) = input.narratives.first() {
        let list: Vec<&str> = input.narratives.iter().map(|n| n.name.as_str()).collect();
        let mut line = format!("Top narratives: {}", list.join(", "));
        if let Some(strength) = &top.strength {
            line.push_str(&format!(". {} appears to be {}", top.name, strength));
        }
        insights.push(line);
    }

    insights
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_intel::VideoSentiment;

    #[test]
    fn test_empty_input_has_no_insights() {
        assert!(generate_insights(&InsightInput::default()).is_empty());
    }

    #[test]
    fn test_full_insights() {
        let sentiment = SentimentBreakdown::tally(vec![
            VideoSentiment::Bullish,
            VideoSentiment::Bullish,
            VideoSentiment::Bearish,
        ]);
        let mut builder = InsightBuilder::new(3, sentiment);
        builder.token("sol", true);
        builder.token("SOL", true);
        builder.token("SOL", false);
        builder.token("eth", false);
        builder.narrative("AI agents", Some(NarrativeStrength::Strong));
        builder.narrative("AI agents", Some(NarrativeStrength::Strong));
        builder.narrative("RWA", Some(NarrativeStrength::Weak));

        let insights = generate_insights(&builder.build());
        assert_eq!(
            insights,
            vec![
                "Bullish sentiment dominates with 67% of analyzed items".to_string(),
                "Most discussed tokens: SOL, ETH. SOL has 67% positive sentiment".to_string(),
                "Top narratives: AI agents, RWA. AI agents appears to be strong".to_string(),
            ]
        );
    }

    #[test]
    fn test_narratives_without_strength() {
        let sentiment = SentimentBreakdown::tally(vec![VideoSentiment::Neutral]);
        let mut builder = InsightBuilder::new(1, sentiment);
        builder.narrative("Bitcoin ETFs", None);

        let insights = generate_insights(&builder.build());
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[1], "Top narratives: Bitcoin ETFs");
    }

    #[test]
    fn test_strength_tie_goes_to_stronger_value() {
        let sentiment = SentimentBreakdown::tally(vec![VideoSentiment::Bullish, VideoSentiment::Bullish]);
        let mut builder = InsightBuilder::new(2, sentiment);
        builder.narrative("AI agents", Some(NarrativeStrength::Weak));
        builder.narrative("AI agents", Some(NarrativeStrength::Strong));

        let input = builder.build();
        assert_eq!(input.narratives[0].strength.as_deref(), Some("strong"));
    }
}

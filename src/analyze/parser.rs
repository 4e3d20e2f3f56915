// src/analyze/parser.rs
//! Turns the classifier's free-form reply into a `Verdict`.
//!
//! The reply is not guaranteed to be JSON, so parsing is an ordered chain of
//! strategies; the first one that produces a verdict wins:
//!
//! 1. `EmbeddedJson`   : first `{` .. last `}` parsed as the documented schema
//! 2. `KeywordFallback`: only when the reply has no `{ … }` span at all
//! 3. `NeutralFallback`: always succeeds with a fixed neutral verdict
//!
//! The chain never fails.

use serde::Deserialize;
use serde_json::Value;

use crate::analyze::sanitize::limit_sentences;
use crate::model::{Classification, Verdict};

pub const KEYWORD_CONFIDENCE: u8 = 75;
pub const NEUTRAL_CONFIDENCE: u8 = 50;

pub const KEYWORD_SOURCES: &[&str] = &["Snopes.com", "FactCheck.org", "Reuters Fact Check"];
pub const KEYWORD_RECOMMENDATIONS: &[&str] = &[
    "Cross-check the claims with established fact-checking organizations.",
    "Look for coverage of the same story from multiple reputable news outlets.",
    "Verify the original source of the content before sharing it.",
];

pub const NEUTRAL_EXPLANATION: &str = "We were unable to complete a full analysis of this content. \
Please verify it with trusted fact-checking sources before drawing conclusions.";
pub const NEUTRAL_SOURCES: &[&str] = &["Snopes.com", "FactCheck.org"];
pub const NEUTRAL_RECOMMENDATIONS: &[&str] = &[
    "Verify the content with trusted fact-checking sources.",
    "Try the analysis again later.",
];

/// Which strategy produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Json,
    Keyword,
    Neutral,
}

impl ParseTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseTier::Json => "json",
            ParseTier::Keyword => "keyword",
            ParseTier::Neutral => "neutral",
        }
    }

    /// Whether the explanation is model prose that still needs sanitizing.
    pub fn needs_sanitizing(self) -> bool {
        !matches!(self, ParseTier::Neutral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub verdict: Verdict,
    pub tier: ParseTier,
}

/// One step of the chain: a verdict, or `None` to let the next strategy try.
pub trait ParseStrategy: Send + Sync {
    fn tier(&self) -> ParseTier;
    fn try_parse(&self, raw: &str) -> Option<Verdict>;
}

/// Byte range of the greedy `{ … }` span (first `{` through last `}`).
pub fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Lenient mirror of the documented reply schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplySchema {
    classification: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    key_terms: Option<Vec<String>>,
    #[serde(default)]
    verification_sources: Option<Vec<String>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

/// Clamp whatever the classifier sent into 0..=100. Numeric strings are accepted.
fn clamp_confidence(v: Option<&Value>) -> u8 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(x) if x.is_finite() => x.round().clamp(0.0, 100.0) as u8,
        _ => NEUTRAL_CONFIDENCE,
    }
}

fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedJson;

impl ParseStrategy for EmbeddedJson {
    fn tier(&self) -> ParseTier {
        ParseTier::Json
    }

    fn try_parse(&self, raw: &str) -> Option<Verdict> {
        let span = json_span(raw)?;
        let schema: ReplySchema = match serde_json::from_str(span) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, span_len = span.len(), "malformed classifier reply");
                return None;
            }
        };
        let Some(classification) = Classification::from_label(&schema.classification) else {
            tracing::warn!(
                label = %schema.classification,
                "classifier reply used an unknown classification label"
            );
            return None;
        };
        Some(Verdict {
            classification,
            content_type: schema
                .content_type
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            confidence: clamp_confidence(schema.confidence.as_ref()),
            explanation: schema.explanation.unwrap_or_default().trim().to_string(),
            key_terms: clean_list(schema.key_terms),
            verification_sources: clean_list(schema.verification_sources),
            recommendations: clean_list(schema.recommendations),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordFallback;

impl ParseStrategy for KeywordFallback {
    fn tier(&self) -> ParseTier {
        ParseTier::Keyword
    }

    fn try_parse(&self, raw: &str) -> Option<Verdict> {
        if json_span(raw).is_some() {
            return None;
        }
        let lower = raw.to_lowercase();
        let classification = if lower.contains("disinformation") || lower.contains("false") {
            Classification::Disinformation
        } else {
            Classification::NotDisinformation
        };
        Some(Verdict {
            classification,
            content_type: None,
            confidence: KEYWORD_CONFIDENCE,
            explanation: limit_sentences(raw, 3),
            key_terms: Vec::new(),
            verification_sources: to_owned_list(KEYWORD_SOURCES),
            recommendations: to_owned_list(KEYWORD_RECOMMENDATIONS),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralFallback;

impl NeutralFallback {
    pub fn verdict() -> Verdict {
        Verdict {
            classification: Classification::NotDisinformation,
            content_type: None,
            confidence: NEUTRAL_CONFIDENCE,
            explanation: NEUTRAL_EXPLANATION.to_string(),
            key_terms: Vec::new(),
            verification_sources: to_owned_list(NEUTRAL_SOURCES),
            recommendations: to_owned_list(NEUTRAL_RECOMMENDATIONS),
        }
    }
}

impl ParseStrategy for NeutralFallback {
    fn tier(&self) -> ParseTier {
        ParseTier::Neutral
    }

    fn try_parse(&self, _raw: &str) -> Option<Verdict> {
        Some(Self::verdict())
    }
}

/// First-success-wins combinator over the strategies.
pub struct ResponseParser {
    chain: Vec<Box<dyn ParseStrategy>>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self {
            chain: vec![
                Box::new(EmbeddedJson),
                Box::new(KeywordFallback),
                Box::new(NeutralFallback),
            ],
        }
    }
}

impl ResponseParser {
    pub fn parse(&self, raw: &str) -> ParsedReply {
        for strategy in &self.chain {
            if let Some(verdict) = strategy.try_parse(raw) {
                return ParsedReply {
                    verdict,
                    tier: strategy.tier(),
                };
            }
        }
        ParsedReply {
            verdict: NeutralFallback::verdict(),
            tier: ParseTier::Neutral,
        }
    }
}

// src/model.rs
//! Result types shared by the pipeline, the history store and the HTTP layer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict labels. The wire form is the human-readable label the classifier
/// is instructed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Disinformation")]
    Disinformation,
    #[serde(rename = "Not Disinformation")]
    NotDisinformation,
    #[serde(rename = "NSFW Content")]
    NsfwContent,
    #[serde(rename = "Misleading")]
    Misleading,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Disinformation,
        Classification::NotDisinformation,
        Classification::NsfwContent,
        Classification::Misleading,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Classification::Disinformation => "Disinformation",
            Classification::NotDisinformation => "Not Disinformation",
            Classification::NsfwContent => "NSFW Content",
            Classification::Misleading => "Misleading",
        }
    }

    /// Case-insensitive lookup. Returns `None` for anything outside the four labels.
    pub fn from_label(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parsed classifier verdict before the orchestrator stamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub classification: Classification,
    pub content_type: Option<String>,
    /// Always within 0..=100.
    pub confidence: u8,
    pub explanation: String,
    pub key_terms: Vec<String>,
    pub verification_sources: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Verdict {
    pub fn into_result(self, at: DateTime<Utc>) -> AnalysisResult {
        AnalysisResult {
            classification: self.classification,
            content_type: self.content_type,
            confidence: self.confidence,
            explanation: self.explanation,
            key_terms: self.key_terms,
            verification_sources: self.verification_sources,
            recommendations: self.recommendations,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Final analysis returned by `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub confidence: u8,
    pub explanation: String,
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(default)]
    pub verification_sources: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// ISO-8601 UTC, e.g. `2026-10-19T08:15:00.123Z`.
    pub timestamp: String,
}

/// One persisted history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub content: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

pub const PREVIEW_CHARS: usize = 100;

/// First 100 characters of `content`, with `...` appended when truncated.
pub fn content_preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

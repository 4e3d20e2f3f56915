// src/ingest/mod.rs
//! Link ingestion: recognise supported post links and pull their text.

pub mod reddit;
pub mod types;

use once_cell::sync::Lazy;
use regex::Regex;

pub use reddit::RedditExtractor;
pub use types::{ExtractedPost, ExtractionError, SourceExtractor};

static RE_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme regex"));
static RE_SUPPORTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|old\.)?reddit\.com/r/[^/\s]+").expect("reddit link regex")
});

/// Starts with a URI scheme (`https://`, `ftp://`, ...).
pub fn looks_like_url(input: &str) -> bool {
    RE_SCHEME.is_match(input.trim())
}

/// Reddit link (`www.` / `old.` / bare host) pointing under `/r/`.
pub fn is_supported_link(input: &str) -> bool {
    RE_SUPPORTED.is_match(input.trim())
}

/// Post text is markdown: only HTML entities are decoded, then the ends trimmed.
/// Line breaks and literal `<`/`>` are content and are kept.
pub fn decode_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    decoded.replace("\r\n", "\n").trim().to_string()
}

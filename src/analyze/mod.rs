// src/analyze/mod.rs
//! Analysis pipeline entry: validation → link extraction → classifier call →
//! reply parsing → explanation sanitizing → timestamp → history.

pub mod classifier;
pub mod parser;
pub mod prompt;
pub mod sanitize;

use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::history::HistoryStore;
use crate::ingest::{self, SourceExtractor};
use crate::model::AnalysisResult;

pub use crate::analyze::classifier::{ClassifierClient, ClassifierError, DynClassifier};
pub use crate::analyze::parser::{ParseTier, ResponseParser};
pub use crate::analyze::prompt::{AnalysisRequest, GenerationSettings};
pub use crate::analyze::sanitize::{FixedPicker, OpenerPicker, RandomPicker, Sanitizer};

pub const DEFAULT_MAX_INPUT_CHARS: usize = 20_000;

/// Outcome of one successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    /// Text actually sent to the classifier.
    pub content: String,
    /// Set when a link was replaced by the post's extracted text.
    pub extracted: Option<String>,
    pub tier: ParseTier,
}

// Never log raw content; a short hash identifies it across log lines.
pub(crate) fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub struct Analyzer {
    classifier: DynClassifier,
    extractor: Arc<dyn SourceExtractor>,
    history: Arc<HistoryStore>,
    parser: ResponseParser,
    sanitizer: Sanitizer,
    settings: GenerationSettings,
    max_input_chars: usize,
}

impl Analyzer {
    pub fn new(
        classifier: DynClassifier,
        extractor: Arc<dyn SourceExtractor>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            history,
            parser: ResponseParser::default(),
            sanitizer: Sanitizer::default(),
            settings: GenerationSettings::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max.max(1);
        self
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Validation that needs no network: blank input and unsupported links.
    pub fn validate(input: &str) -> Result<(), AnalysisError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        if ingest::looks_like_url(trimmed) && !ingest::is_supported_link(trimmed) {
            return Err(AnalysisError::UnsupportedLink);
        }
        Ok(())
    }

    fn check_length(&self, content: &str) -> Result<(), AnalysisError> {
        let actual = content.chars().count();
        if actual > self.max_input_chars {
            return Err(AnalysisError::InputTooLong {
                max: self.max_input_chars,
                actual,
            });
        }
        Ok(())
    }

    /// Supported link → post text; any extraction failure keeps the URL itself.
    /// Post text longer than the input cap is truncated to it.
    async fn resolve_content(&self, input: &str) -> (String, Option<String>) {
        if !ingest::is_supported_link(input) {
            return (input.to_string(), None);
        }
        match self.extractor.extract(input).await {
            Ok(post) => {
                let mut text = post.into_content();
                let chars = text.chars().count();
                if chars > self.max_input_chars {
                    info!(
                        chars,
                        max = self.max_input_chars,
                        "extracted post truncated to input limit"
                    );
                    text = text.chars().take(self.max_input_chars).collect();
                }
                (text.clone(), Some(text))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    extractor = self.extractor.name(),
                    "link extraction failed, analyzing the URL text"
                );
                counter!("moderation_extraction_failures_total").increment(1);
                (input.to_string(), None)
            }
        }
    }

    pub async fn analyze(&self, input: &str) -> Result<AnalysisReport, AnalysisError> {
        if let Err(e) = Self::validate(input) {
            counter!("moderation_rejected_total").increment(1);
            return Err(e);
        }
        let input = input.trim();
        self.check_length(input)?;

        let (content, extracted) = self.resolve_content(input).await;
        let id = fingerprint(&content);

        let request = AnalysisRequest::new(&content, &self.settings);
        let t0 = std::time::Instant::now();
        let raw = self.classifier.classify(&request).await;
        histogram!("moderation_classifier_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let raw = raw.map_err(|e| {
            counter!("moderation_classifier_errors_total").increment(1);
            warn!(%id, provider = self.classifier.provider_name(), error = %e, "classifier call failed");
            match e {
                ClassifierError::Status { status, .. } => AnalysisError::ExternalService { status },
                other => AnalysisError::Unavailable(other.into()),
            }
        })?;

        let parsed = self.parser.parse(&raw);
        counter!("moderation_parse_tier_total", "tier" => parsed.tier.as_str()).increment(1);

        let mut verdict = parsed.verdict;
        if parsed.tier.needs_sanitizing() {
            verdict.explanation = self
                .sanitizer
                .finish(&verdict.explanation, verdict.classification);
        }
        let result = verdict.into_result(chrono::Utc::now());
        counter!(
            "moderation_analyses_total",
            "classification" => result.classification.label()
        )
        .increment(1);
        info!(
            %id,
            classification = %result.classification,
            confidence = result.confidence,
            tier = parsed.tier.as_str(),
            extracted = extracted.is_some(),
            "analysis complete"
        );

        // File-backed stores fsync; keep that off the async workers.
        let history = Arc::clone(&self.history);
        let (entry, stamped) = (content.clone(), result.clone());
        match tokio::task::spawn_blocking(move || history.record(&entry, &stamped)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(%id, error = ?e, "failed to persist history"),
            Err(e) => warn!(%id, error = %e, "history write task failed"),
        }

        Ok(AnalysisReport {
            result,
            content,
            extracted,
            tier: parsed.tier,
        })
    }
}

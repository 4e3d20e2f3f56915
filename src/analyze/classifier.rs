//! Classifier adapter: provider abstraction over the external generative-language service.
//!
//! The orchestrator only sees `ClassifierClient`; the Gemini provider does the
//! real HTTP call and `MockClassifier` serves canned replies for tests and
//! local runs (`CLASSIFIER_TEST_MODE=mock`).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

use crate::analyze::prompt::AnalysisRequest;
use crate::config::ClassifierConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier API key is not configured")]
    MissingApiKey,
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier reply could not be decoded: {0}")]
    Decode(String),
    #[error("classifier reply contained no text")]
    EmptyReply,
}

pub type ClassifierFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ClassifierError>> + Send + 'a>>;

/// Trait object used by the orchestrator (and tests).
pub trait ClassifierClient: Send + Sync {
    /// Send one request and return the raw reply text.
    fn classify<'a>(&'a self, request: &'a AnalysisRequest) -> ClassifierFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynClassifier = Arc<dyn ClassifierClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `CLASSIFIER_TEST_MODE=mock` or provider is "mock", returns a deterministic mock.
/// * Otherwise builds the Gemini provider.
pub fn build_classifier(cfg: &ClassifierConfig) -> anyhow::Result<DynClassifier> {
    let test_mode = std::env::var("CLASSIFIER_TEST_MODE")
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false);
    if test_mode || cfg.provider == "mock" {
        tracing::info!("classifier running in mock mode");
        return Ok(Arc::new(MockClassifier::default()));
    }
    match cfg.provider.as_str() {
        "gemini" => {
            if cfg.api_key.is_empty() {
                tracing::warn!("GEMINI_API_KEY is empty; analyses will fail until it is set");
            }
            Ok(Arc::new(GeminiClassifier::new(cfg)?))
        }
        other => anyhow::bail!("Unsupported classifier provider in config: {other}"),
    }
}

// ------------------------------------------------------------
// Gemini provider
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` client. Requires an API key.
pub struct GeminiClassifier {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClassifier {
    pub fn new(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("moderation-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let endpoint = format!("{}/models/{}:generateContent", cfg.base_url, cfg.model);
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint,
        })
    }

    async fn classify_impl(&self, request: &AnalysisRequest) -> Result<String, ClassifierError> {
        if self.api_key.is_empty() {
            return Err(ClassifierError::MissingApiKey);
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Err(ClassifierError::EmptyReply);
        };
        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            tracing::warn!(finish_reason = ?candidate.finish_reason, "empty classifier candidate");
            return Err(ClassifierError::EmptyReply);
        }
        Ok(text)
    }
}

impl ClassifierClient for GeminiClassifier {
    fn classify<'a>(&'a self, request: &'a AnalysisRequest) -> ClassifierFuture<'a> {
        Box::pin(self.classify_impl(request))
    }
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Mock provider
// ------------------------------------------------------------

/// Reply served by `MockClassifier`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Status(u16),
}

const MOCK_DEFAULT_REPLY: &str = r#"{"classification":"Not Disinformation","contentType":"statement","confidence":60,"explanation":"The content makes no verifiable false claims. It reads as ordinary commentary.","keyTerms":[],"verificationSources":["Snopes.com"],"recommendations":["Check the original source."]}"#;

/// Deterministic provider for tests/local runs. Records every prompt it receives.
pub struct MockClassifier {
    reply: MockReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::with_text(MOCK_DEFAULT_REPLY)
    }
}

impl MockClassifier {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    pub fn with_status(status: u16) -> Self {
        Self::new(MockReply::Status(status))
    }

    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl ClassifierClient for MockClassifier {
    fn classify<'a>(&'a self, request: &'a AnalysisRequest) -> ClassifierFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut p) = self.prompts.lock() {
            p.push(request.prompt().to_string());
        }
        let out = match &self.reply {
            MockReply::Text(t) => Ok(t.clone()),
            MockReply::Status(s) => Err(ClassifierError::Status {
                status: *s,
                body: "mock failure".to_string(),
            }),
        };
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::prompt::GenerationSettings;

    #[tokio::test]
    async fn mock_records_calls_and_prompts() {
        let mock = MockClassifier::with_text("{}");
        let req = AnalysisRequest::new("some text", &GenerationSettings::default());
        let out = mock.classify(&req).await.unwrap();
        assert_eq!(out, "{}");
        assert_eq!(mock.calls(), 1);
        assert!(mock.prompts()[0].contains("some text"));
    }

    #[tokio::test]
    async fn mock_status_reply_is_an_error() {
        let mock = MockClassifier::with_status(503);
        let req = AnalysisRequest::new("x", &GenerationSettings::default());
        match mock.classify(&req).await {
            Err(ClassifierError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gemini_without_key_fails_before_network() {
        let cfg = ClassifierConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            ..ClassifierConfig::default()
        };
        let client = GeminiClassifier::new(&cfg).unwrap();
        let req = AnalysisRequest::new("x", &GenerationSettings::default());
        assert!(matches!(
            client.classify(&req).await,
            Err(ClassifierError::MissingApiKey)
        ));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let cfg = ClassifierConfig {
            provider: "carrier-pigeon".to_string(),
            ..ClassifierConfig::default()
        };
        if std::env::var("CLASSIFIER_TEST_MODE").is_err() {
            assert!(build_classifier(&cfg).is_err());
        }
    }
}

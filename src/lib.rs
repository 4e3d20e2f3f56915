// src/lib.rs
// Public library surface for the service binary, the CLI and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod model;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use crate::analyze::{AnalysisReport, Analyzer};
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::AnalysisError;
pub use crate::model::{AnalysisResult, Classification, HistoryItem};

use crate::analyze::{classifier::build_classifier, GenerationSettings};
use crate::history::{FileStore, HistoryStore};
use crate::ingest::RedditExtractor;

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `MODERATION_LOG_JSON=1` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moderation_analyzer=info,tower_http=info,warn"));
    let json = std::env::var("MODERATION_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    // A subscriber may already be installed by the hosting runtime.
    let _ = res;
}

/// Wire classifier, extractor and file-backed history from config.
pub fn build_analyzer(cfg: &AppConfig) -> anyhow::Result<Analyzer> {
    let classifier = build_classifier(&cfg.classifier).context("building classifier")?;
    let extractor = Arc::new(RedditExtractor::new(&cfg.extractor).context("building extractor")?);
    let store = Arc::new(FileStore::new(&cfg.history.dir)?);
    let history = Arc::new(HistoryStore::load(store, cfg.history.capacity));
    info!(
        provider = classifier.provider_name(),
        model = %cfg.classifier.model,
        history_items = history.len(),
        "analyzer ready"
    );

    Ok(Analyzer::new(classifier, extractor, history)
        .with_settings(GenerationSettings::from(&cfg.classifier))
        .with_max_input_chars(cfg.limits.max_input_chars))
}

/// Full in-process app: config, analyzer, API routes and `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load()?;
    let analyzer = build_analyzer(&cfg)?;
    let metrics = crate::metrics::Metrics::init()?;
    Ok(router(AppState::new(analyzer)).merge(metrics.router()))
}

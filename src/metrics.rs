use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE.get_or_try_init(|| {
            // Use default buckets to avoid API differences across crate versions.
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe();
            Ok::<_, anyhow::Error>(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "moderation_analyses_total",
        "Completed analyses by classification."
    );
    describe_counter!(
        "moderation_parse_tier_total",
        "Classifier replies by the parse strategy that produced the verdict."
    );
    describe_counter!(
        "moderation_extraction_failures_total",
        "Link extractions that fell back to the raw URL."
    );
    describe_counter!(
        "moderation_classifier_errors_total",
        "Failed classifier calls."
    );
    describe_counter!(
        "moderation_rejected_total",
        "Inputs rejected by validation."
    );
    describe_histogram!(
        "moderation_classifier_ms",
        "Classifier round-trip time in milliseconds."
    );
    describe_histogram!(
        "moderation_extraction_ms",
        "Link extraction time in milliseconds."
    );
}

//! Moderation Analyzer: binary entrypoint.
//! Boots the Axum HTTP server under the Shuttle runtime.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    moderation_analyzer::init_tracing();

    let router = moderation_analyzer::app().await?;
    Ok(router.into())
}

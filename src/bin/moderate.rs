//! One-off analysis from the command line.
//!
//!   cargo run --bin moderate -- "The earth is flat and NASA is lying."
//!
//! Prints the result JSON. Uses the same config as the service.

use anyhow::Context;
use moderation_analyzer::{build_analyzer, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    moderation_analyzer::init_tracing();

    let content = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let cfg = AppConfig::load()?;
    let analyzer = build_analyzer(&cfg)?;

    match analyzer.analyze(&content).await {
        Ok(report) => {
            let out = serde_json::to_string_pretty(&report.result).context("encoding result")?;
            println!("{out}");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = ?e, "analysis failed");
            anyhow::bail!("{}", e.public_message())
        }
    }
}

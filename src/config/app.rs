// src/config/app.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "MODERATION_CONFIG_PATH";

const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_output_tokens() -> u32 {
    1200
}
fn default_classifier_timeout() -> u64 {
    30
}
fn default_proxy_url() -> String {
    "https://api.allorigins.win/get".to_string()
}
fn default_extractor_timeout() -> u64 {
    10
}
fn default_max_input_chars() -> usize {
    20_000
}
fn default_history_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_history_capacity() -> usize {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// "gemini" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_classifier_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// CORS proxy endpoint; the target goes into its `url` query parameter.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_extractor_timeout")]
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            timeout_secs: default_extractor_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory for the JSON-file key-value store.
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
            capacity: default_history_capacity(),
        }
    }
}

impl AppConfig {
    /// Load using MODERATION_CONFIG_PATH or `config/app.toml`.
    /// A missing file is not an error: defaults + env apply.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Self::from_toml_str("")
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(model) = env::var(ENV_GEMINI_MODEL) {
            if !model.trim().is_empty() {
                self.classifier.model = model.trim().to_string();
            }
        }
        if self.classifier.api_key.trim().eq_ignore_ascii_case("env") {
            // Resolved lazily: a missing key only fails real classifier calls.
            self.classifier.api_key = env::var(ENV_GEMINI_API_KEY).unwrap_or_default();
        }
    }

    fn sanitize(&mut self) {
        self.classifier.provider = self.classifier.provider.trim().to_lowercase();
        self.classifier.base_url = self.classifier.base_url.trim_end_matches('/').to_string();
        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            self.classifier.temperature = default_temperature();
        }
        if self.classifier.max_output_tokens == 0 {
            self.classifier.max_output_tokens = default_max_output_tokens();
        }
        if self.classifier.timeout_secs == 0 {
            self.classifier.timeout_secs = default_classifier_timeout();
        }
        if self.extractor.timeout_secs == 0 {
            self.extractor.timeout_secs = default_extractor_timeout();
        }
        if self.limits.max_input_chars == 0 {
            self.limits.max_input_chars = default_max_input_chars();
        }
        if self.history.capacity == 0 {
            self.history.capacity = default_history_capacity();
        }
    }
}

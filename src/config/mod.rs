// src/config/mod.rs
pub mod app;

pub use app::{
    AppConfig, ClassifierConfig, ExtractorConfig, HistoryConfig, LimitsConfig,
    DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH,
};

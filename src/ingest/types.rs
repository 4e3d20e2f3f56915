// src/ingest/types.rs
use async_trait::async_trait;

/// Text pulled out of a linked post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPost {
    pub title: String,
    pub body: String,
}

impl ExtractedPost {
    /// Title and body separated by a blank line; just the title when the body is empty.
    pub fn into_content(self) -> String {
        if self.body.is_empty() {
            self.title
        } else {
            format!("{}\n\n{}", self.title, self.body)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("proxy request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("proxy returned HTTP {0}")]
    Status(u16),
    #[error("proxy envelope could not be parsed: {0}")]
    Envelope(String),
    #[error("post listing could not be parsed: {0}")]
    Listing(String),
    #[error("listing contained no post with a title")]
    MissingPost,
}

#[async_trait]
pub trait SourceExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedPost, ExtractionError>;
    fn name(&self) -> &'static str;
}

// src/ingest/reddit.rs
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ExtractorConfig;
use crate::ingest::decode_text;
use crate::ingest::types::{ExtractedPost, ExtractionError, SourceExtractor};

/// Proxy envelope: the fetched document arrives as a string in `contents`.
#[derive(Debug, Deserialize)]
struct Envelope {
    contents: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: Option<String>,
    selftext: Option<String>,
}

/// `https://www.reddit.com/r/x/comments/id/slug/?utm=1` → `https://www.reddit.com/r/x/comments/id/slug.json`
pub fn json_url(url: &str) -> String {
    let base = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim();
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{base}.json")
}

/// Parse the proxy body down to the first post's title and selftext.
pub fn parse_proxy_body(body: &str) -> Result<ExtractedPost, ExtractionError> {
    let env: Envelope =
        serde_json::from_str(body).map_err(|e| ExtractionError::Envelope(e.to_string()))?;
    let contents = env
        .contents
        .ok_or_else(|| ExtractionError::Envelope("missing `contents`".to_string()))?;

    // Only a post page is `[post listing, comments listing]`. Subreddit and
    // front pages are a bare listing of unrelated posts and must not match.
    let doc: Vec<Listing> =
        serde_json::from_str(&contents).map_err(|e| ExtractionError::Listing(e.to_string()))?;
    let first = doc.into_iter().next().ok_or(ExtractionError::MissingPost)?;

    let post = first
        .data
        .children
        .into_iter()
        .next()
        .ok_or(ExtractionError::MissingPost)?
        .data;

    let title = decode_text(post.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return Err(ExtractionError::MissingPost);
    }
    let body = decode_text(post.selftext.as_deref().unwrap_or_default());
    Ok(ExtractedPost { title, body })
}

/// Fetches Reddit post JSON through an allorigins-style CORS proxy.
pub struct RedditExtractor {
    http: reqwest::Client,
    proxy_url: String,
}

impl RedditExtractor {
    pub fn new(cfg: &ExtractorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("moderation-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            proxy_url: cfg.proxy_url.clone(),
        })
    }
}

#[async_trait]
impl SourceExtractor for RedditExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedPost, ExtractionError> {
        let t0 = std::time::Instant::now();
        let target = json_url(url);

        let resp = self
            .http
            .get(&self.proxy_url)
            .query(&[("url", target.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ExtractionError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        let post = parse_proxy_body(&body)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("moderation_extraction_ms").record(ms);
        Ok(post)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(contents: &serde_json::Value) -> String {
        json!({ "contents": contents.to_string(), "status": { "http_code": 200 } }).to_string()
    }

    #[test]
    fn json_url_strips_slash_query_and_fragment() {
        assert_eq!(
            json_url("https://www.reddit.com/r/news/comments/abc/title/"),
            "https://www.reddit.com/r/news/comments/abc/title.json"
        );
        assert_eq!(
            json_url("https://old.reddit.com/r/news/comments/abc/title?utm_source=share#top"),
            "https://old.reddit.com/r/news/comments/abc/title.json"
        );
    }

    #[test]
    fn parses_post_listing_pair() {
        let listing = json!([
            { "kind": "Listing", "data": { "children": [
                { "kind": "t3", "data": { "title": "Moon landing &amp; hoaxes", "selftext": "Body  text\nhere" } }
            ]}},
            { "kind": "Listing", "data": { "children": [
                { "kind": "t1", "data": { "body": "a comment" } }
            ]}}
        ]);
        let post = parse_proxy_body(&envelope(&listing)).unwrap();
        assert_eq!(post.title, "Moon landing & hoaxes");
        assert_eq!(post.body, "Body  text\nhere");
        assert_eq!(
            post.into_content(),
            "Moon landing & hoaxes\n\nBody  text\nhere"
        );
    }

    #[test]
    fn link_posts_without_body_yield_title_only() {
        let listing = json!([{ "data": { "children": [
            { "data": { "title": "Just a link", "selftext": "" } }
        ]}}]);
        let post = parse_proxy_body(&envelope(&listing)).unwrap();
        assert_eq!(post.into_content(), "Just a link");
    }

    #[test]
    fn failures_are_typed() {
        assert!(matches!(
            parse_proxy_body("not json"),
            Err(ExtractionError::Envelope(_))
        ));
        assert!(matches!(
            parse_proxy_body(r#"{"contents": null}"#),
            Err(ExtractionError::Envelope(_))
        ));
        assert!(matches!(
            parse_proxy_body(r#"{"contents": "<html>blocked</html>"}"#),
            Err(ExtractionError::Listing(_))
        ));
        let empty = json!([{ "data": { "children": [] } }]);
        assert!(matches!(
            parse_proxy_body(&envelope(&empty)),
            Err(ExtractionError::MissingPost)
        ));
        let untitled = json!([{ "data": { "children": [ { "data": { "selftext": "x" } } ] } }]);
        assert!(matches!(
            parse_proxy_body(&envelope(&untitled)),
            Err(ExtractionError::MissingPost)
        ));
    }

    #[test]
    fn subreddit_listing_is_not_a_post() {
        // `/r/news.json` is one listing of hot posts, not the linked post.
        let hot = json!({ "kind": "Listing", "data": { "children": [
            { "kind": "t3", "data": { "title": "Unrelated hot post", "selftext": "someone else's text" } }
        ]}});
        assert!(matches!(
            parse_proxy_body(&envelope(&hot)),
            Err(ExtractionError::Listing(_))
        ));
    }

    #[test]
    fn selftext_markdown_survives_intact() {
        let listing = json!([{ "data": { "children": [
            { "data": {
                "title": "  Inequalities &amp; proofs ",
                "selftext": "If a<b and c>d then\n\nsecond paragraph &gt; quoted\n"
            } }
        ]}}]);
        let post = parse_proxy_body(&envelope(&listing)).unwrap();
        assert_eq!(post.title, "Inequalities & proofs");
        assert_eq!(post.body, "If a<b and c>d then\n\nsecond paragraph > quoted");
    }
}

// src/analyze/prompt.rs
//! Outbound request for the classifier: fixed instructions + the content, and
//! a low-temperature generation config.

use serde::Serialize;

use crate::config::ClassifierConfig;

/// Generation knobs sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 1200,
        }
    }
}

impl From<&ClassifierConfig> for GenerationSettings {
    fn from(cfg: &ClassifierConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        }
    }
}

const INSTRUCTIONS: &str = r#"You are a content moderation and fact-checking assistant. Analyze the content below and respond with a single JSON object and nothing else.

Rules:
1. "classification" must be exactly one of: "Disinformation", "Not Disinformation", "NSFW Content", "Misleading".
2. Sexual or otherwise adult content must be classified as "NSFW Content" and described as fictional material; do not reproduce explicit details.
3. Use "Misleading" for content that is technically accurate but lacks context or is framed deceptively.
4. "confidence" is an integer from 0 to 100.
5. "explanation" is 3 to 4 plain sentences about the content itself. Do not mention being an AI, a language model, or an automated system, and do not add disclaimers.
6. "keyTerms" lists the short phrases that drove the decision.
7. "verificationSources" lists names of reputable fact-checking or news organizations.
8. "recommendations" lists concrete actions a reader can take.

Respond using this schema:
{
  "classification": "Disinformation" | "Not Disinformation" | "NSFW Content" | "Misleading",
  "contentType": "short description of the kind of content",
  "confidence": 0-100,
  "explanation": "3-4 sentences",
  "keyTerms": ["term"],
  "verificationSources": ["source name"],
  "recommendations": ["action"]
}"#;

/// Full prompt: fixed rules with the content interpolated verbatim once.
pub fn build_prompt(content: &str) -> String {
    format!("{INSTRUCTIONS}\n\nContent to analyze:\n\"\"\"\n{content}\n\"\"\"")
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPart {
    pub text: String,
}

impl AnalysisRequest {
    pub fn new(content: &str, settings: &GenerationSettings) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(content),
                }],
            }],
            generation_config: *settings,
        }
    }

    /// The single prompt carried by this request.
    pub fn prompt(&self) -> &str {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_interpolated_verbatim() {
        let content = "Line one\n  {\"weird\": true}  ";
        let p = build_prompt(content);
        assert!(p.contains(content));
        assert_eq!(p.matches(content).count(), 1);
        assert!(p.contains("\"NSFW Content\""));
    }

    #[test]
    fn serializes_as_generate_content_body() {
        let req = AnalysisRequest::new("hello", &GenerationSettings::default());
        let v = serde_json::to_value(&req).unwrap();
        let text = v["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.ends_with("hello\n\"\"\""));
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 1200);
        let t = v["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((t - 0.1).abs() < 1e-6);
        assert_eq!(req.prompt(), text);
    }

    #[test]
    fn oversized_input_is_not_chunked() {
        let big = "x".repeat(50_000);
        let req = AnalysisRequest::new(&big, &GenerationSettings::default());
        assert_eq!(req.contents.len(), 1);
        assert!(req.prompt().contains(&big));
    }
}

// src/analyze/sanitize.rs
//! Explanation post-processing.
//!
//! Two steps:
//! - strip meta/self-referential phrases ("as an AI", "I cannot confirm", vendor names)
//! - prepend a classification-keyed opener, picked through an injectable `OpenerPicker`
//!
//! Stripping is plain pattern removal; the remaining text may read a little rough.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;

use crate::model::Classification;

/// Opener used for classifications without a pool.
pub const GENERIC_OPENER: &str = "Analysis complete.";

const DISINFORMATION_OPENERS: &[&str] = &[
    "This content contains false or misleading claims.",
    "The claims in this content are not supported by credible evidence.",
    "This content spreads information that contradicts established facts.",
    "Fact-checking indicates that this content is inaccurate.",
];

const NOT_DISINFORMATION_OPENERS: &[&str] = &[
    "This content appears to be factually accurate.",
    "The claims in this content are consistent with reliable sources.",
    "No signs of disinformation were found in this content.",
    "This content aligns with verified information.",
];

const NSFW_OPENERS: &[&str] = &[
    "This content contains adult material.",
    "This content has been flagged as not safe for work.",
    "This content includes explicit material and is treated as fictional.",
];

/// Opener pool for a classification. Empty for `Misleading`.
pub fn openers_for(classification: Classification) -> &'static [&'static str] {
    match classification {
        Classification::Disinformation => DISINFORMATION_OPENERS,
        Classification::NotDisinformation => NOT_DISINFORMATION_OPENERS,
        Classification::NsfwContent => NSFW_OPENERS,
        Classification::Misleading => &[],
    }
}

// Longer phrases first so "as an AI language model" goes before "language model".
static DISCLAIMERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bas\s+an\s+ai\b(?:\s+(?:language\s+model|model|assistant))?\s*,?",
        r"(?i)\bi(?:'m|\s+am)\s+(?:just\s+)?an\s+ai\b(?:\s+(?:language\s+model|model|assistant))?\s*[,.]?",
        r"(?i)\bi\s+(?:cannot|can't|can\s+not)(?:\s+(?:confirm|verify|determine|provide|browse))?(?:\.\.\.|…)?",
        r"(?i)\bi(?:'m|\s+am)\s+(?:not\s+able|unable)\s+to(?:\s+(?:confirm|verify|determine|provide|browse))?",
        r"(?i)\bi\s+apologi[sz]e\s*,?",
        r"(?i)\bas\s+of\s+my\s+(?:last\s+)?(?:knowledge\s+)?(?:update|cutoff)\s*,?",
        r"(?i)\bmy\s+training\s+data\b",
        r"(?i)\b(?:large\s+)?language\s+model\b",
        r"(?i)\bai\s+model\b",
        r"(?i)\b(?:google\s+)?gemini\b",
        r"(?i)\bgoogle\b",
        r"(?i)\bopenai\b",
        r"(?i)\bchatgpt\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("disclaimer regex"))
    .collect()
});

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_LEADING_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s,;:.…\-]+").expect("leading punct regex"));
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([,.;:!?])").expect("space-before-punct regex"));

fn strip_once(input: &str) -> String {
    let mut out = input.to_string();
    for re in DISCLAIMERS.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    out = RE_WS.replace_all(&out, " ").into_owned();
    out = RE_SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = RE_LEADING_PUNCT.replace(&out, "").into_owned();
    out.trim().to_string()
}

/// Remove every denylisted phrase. Runs to a fixed point, so a removal can
/// never leave behind a freshly assembled phrase.
pub fn strip_disclaimers(input: &str) -> String {
    let mut current = strip_once(input);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Keep at most `max` sentences (split after `.`, `!` or `?` followed by whitespace).
pub fn limit_sentences(text: &str, max: usize) -> String {
    let mut count = 0usize;
    let mut prev_terminal = false;
    for (idx, ch) in text.char_indices() {
        if prev_terminal && ch.is_whitespace() {
            count += 1;
            if count >= max {
                return text[..idx].trim().to_string();
            }
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }
    text.trim().to_string()
}

/// Source of the opener index. Production uses the thread RNG; tests pin it.
pub trait OpenerPicker: Send + Sync {
    /// Return an index in `0..len`. Called only with `len > 0`.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl OpenerPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks `index` (wrapped into range).
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl OpenerPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Clone)]
pub struct Sanitizer {
    picker: Arc<dyn OpenerPicker>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(Arc::new(RandomPicker))
    }
}

impl Sanitizer {
    pub fn new(picker: Arc<dyn OpenerPicker>) -> Self {
        Self { picker }
    }

    pub fn opener(&self, classification: Classification) -> &'static str {
        let pool = openers_for(classification);
        if pool.is_empty() {
            return GENERIC_OPENER;
        }
        pool[self.picker.pick(pool.len()).min(pool.len() - 1)]
    }

    /// Opener + single space + stripped explanation.
    pub fn finish(&self, explanation: &str, classification: Classification) -> String {
        let opener = self.opener(classification);
        let body = strip_disclaimers(explanation);
        if body.is_empty() {
            opener.to_string()
        } else {
            format!("{opener} {body}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ai_disclaimer_prefix() {
        let out = strip_disclaimers("As an AI, I cannot confirm... this claim is false.");
        assert_eq!(out, "this claim is false.");
    }

    #[test]
    fn strips_vendor_names_and_model_mentions() {
        let out = strip_disclaimers(
            "According to Google Gemini, a large language model, the post is fabricated.",
        );
        assert!(!out.to_lowercase().contains("gemini"));
        assert!(!out.to_lowercase().contains("google"));
        assert!(!out.to_lowercase().contains("language model"));
        assert!(out.ends_with("the post is fabricated."), "got: {out}");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "As an AI, I cannot confirm... this claim is false.",
            "as an as an AI, AI said",
            "I am an AI language model. I'm unable to verify the photo.",
            "Plain sentence with nothing to remove.",
            "   ,,, leading junk then text",
            "",
        ];
        for s in samples {
            let once = strip_disclaimers(s);
            let twice = strip_disclaimers(&once);
            assert_eq!(once, twice, "input: {s:?}");
        }
    }

    #[test]
    fn reassembled_phrase_is_removed_too() {
        let out = strip_disclaimers("as an as an AI, AI said");
        assert_eq!(out, "said");
    }

    #[test]
    fn fixed_picker_selects_opener() {
        let s = Sanitizer::new(Arc::new(FixedPicker(2)));
        let out = s.finish("Claim is wrong.", Classification::Disinformation);
        assert_eq!(out, format!("{} Claim is wrong.", DISINFORMATION_OPENERS[2]));
    }

    #[test]
    fn misleading_uses_generic_opener() {
        let s = Sanitizer::new(Arc::new(FixedPicker(0)));
        let out = s.finish("Context is missing.", Classification::Misleading);
        assert_eq!(out, "Analysis complete. Context is missing.");
    }

    #[test]
    fn empty_body_yields_just_the_opener() {
        let s = Sanitizer::new(Arc::new(FixedPicker(1)));
        let out = s.finish("As an AI,", Classification::NsfwContent);
        assert_eq!(out, NSFW_OPENERS[1]);
    }

    #[test]
    fn pools_have_expected_sizes() {
        assert_eq!(openers_for(Classification::Disinformation).len(), 4);
        assert_eq!(openers_for(Classification::NotDisinformation).len(), 4);
        assert_eq!(openers_for(Classification::NsfwContent).len(), 3);
        assert!(openers_for(Classification::Misleading).is_empty());
    }

    #[test]
    fn random_picker_stays_in_range() {
        let p = RandomPicker;
        for _ in 0..200 {
            assert!(p.pick(4) < 4);
        }
    }

    #[test]
    fn limit_sentences_keeps_first_three() {
        let t = "One. Two! Three? Four. Five.";
        assert_eq!(limit_sentences(t, 3), "One. Two! Three?");
        assert_eq!(limit_sentences("No terminator here", 3), "No terminator here");
        assert_eq!(limit_sentences("Version 1.5 is out. Yes.", 3), "Version 1.5 is out. Yes.");
    }
}

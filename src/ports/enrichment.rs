//! Enrichment port: plain-language details about an accepted prediction.

#![allow(missing_docs)]

use std::fmt::Write as _;

use super::command::ExternalCommand;
use crate::core::errors::{BevError, Result};

/// Label and confidence in, explanatory text out.
pub trait Enricher: Send + Sync {
    fn enrich(&self, label: &str, confidence: f64) -> Result<String>;
}

/// Format a `0.0..=1.0` confidence as a whole percentage.
#[must_use]
pub fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Prompt for a text generator, written for readers with limited English.
#[must_use]
pub fn build_prompt(label: &str, confidence: f64) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are helping a non-native speaker identify an alcoholic beverage they photographed."
    );
    let _ = writeln!(prompt, "The image classifier identified this as: {label}");
    let _ = writeln!(prompt, "Classifier confidence: {}", percent(confidence));
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Please provide in plain, simple English (suitable for someone with limited language skills):"
    );
    for (idx, item) in [
        "What type of alcohol this is (category and subcategory)",
        "Typical alcohol content (ABV range or proof)",
        "Where it originates from",
        "What foods it pairs well with",
        "One brief safety note about alcohol consumption",
    ]
    .iter()
    .enumerate()
    {
        let _ = writeln!(prompt, "{}. {item}", idx + 1);
    }
    let _ = writeln!(prompt);
    let _ = write!(prompt, "Keep each point to 1-2 sentences. Use simple vocabulary.");
    prompt
}

/// Stand-in used until a text generator is connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEnricher;

impl Enricher for PlaceholderEnricher {
    fn enrich(&self, label: &str, confidence: f64) -> Result<String> {
        let mut text = String::new();
        let _ = writeln!(text, "Classification: {label}");
        let _ = writeln!(text, "Confidence: {}", percent(confidence));
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "Detailed enrichment is not connected yet. Once a text generator is configured, this section will show:"
        );
        for line in [
            "Beverage category and subcategory",
            "Typical alcohol content (ABV / proof)",
            "Cultural background and origin",
            "Suggested food pairings",
            "Safe consumption notes",
        ] {
            let _ = writeln!(text, "- {line}");
        }
        Ok(text.trim_end().to_string())
    }
}

/// Enricher backed by an external text generator. The prompt goes to stdin;
/// `BEVID_ENRICH_MODEL` and `BEVID_MAX_TOKENS` carry generation settings.
#[derive(Debug, Clone)]
pub struct CommandEnricher {
    command: ExternalCommand,
}

impl CommandEnricher {
    #[must_use]
    pub fn new(command: ExternalCommand, model: &str, max_tokens: u32) -> Self {
        Self {
            command: command
                .env("BEVID_ENRICH_MODEL", model)
                .env("BEVID_MAX_TOKENS", max_tokens.to_string()),
        }
    }
}

impl Enricher for CommandEnricher {
    fn enrich(&self, label: &str, confidence: f64) -> Result<String> {
        let prompt = build_prompt(label, confidence);
        let text = self
            .command
            .run(prompt.as_bytes())
            .map_err(|reason| BevError::Enrichment { reason })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(BevError::Enrichment {
                reason: "generator returned no text".to_string(),
            });
        }
        Ok(text.to_string())
    }
}

//! Confidence analyzer: ranked scores in, tiered risk verdict out.
//!
//! The analyzer is a pure function of its input and the configured
//! thresholds/taxonomy. It never performs I/O and returns the same report for
//! the same input.
//!
//! A top label from the non-alcohol set is always treated as a
//! false-negative risk: the message is danger-severity and enrichment is
//! blocked even when the score is in the `high` tier.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::ranked::{RankedResult, RankedResults, validate_ranked};
use crate::core::config::{Config, ThresholdConfig};
use crate::core::errors::{BevError, Result};
use crate::core::taxonomy::LabelTaxonomy;

/// Message shown when the top label claims the drink has no alcohol.
pub const FALSE_NEGATIVE_MESSAGE: &str = "The model thinks this may NOT contain alcohol, but it is not certain. \
     Please check the physical label before acting on this result.";
/// Message for a high-confidence alcoholic verdict.
pub const CONFIDENT_ALCOHOL_MESSAGE: &str = "The model is confident this is an alcoholic beverage.";
/// Message for a high-confidence verdict outside the alcohol set.
pub const CONFIDENT_NON_ALCOHOL_MESSAGE: &str =
    "The model is confident this does not appear to be alcoholic.";
/// Message for the medium tier.
pub const CONFIRM_MESSAGE: &str = "The model is not fully sure. \
     Please review the options below and confirm which looks right.";
/// Message for the low tier.
pub const UNCERTAIN_MESSAGE: &str = "The model is uncertain about this image. \
     We recommend checking the physical label before relying on this result.";

/// Bucketed confidence of the top prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Bucket a score. Both boundaries are inclusive on the upper side:
    /// `score == high` is `High`, `score == medium` is `Medium`.
    #[must_use]
    pub fn from_score(score: f64, high: f64, medium: f64) -> Self {
        if score >= high {
            Self::High
        } else if score >= medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Human label used next to each candidate bar.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::High => "High confidence",
            Self::Medium => "Moderate confidence",
            Self::Low => "Low confidence",
        }
    }
}

/// How alarming the verdict banner should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Caution,
    Danger,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Caution => "caution",
            Self::Danger => "danger",
        }
    }
}

/// Structured verdict derived from one set of ranked results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub top_label: String,
    pub top_score: f64,
    pub confidence_tier: ConfidenceTier,
    pub is_alcohol: bool,
    pub false_negative_risk: bool,
    pub top_n: RankedResults,
    pub plain_message: String,
    pub severity: Severity,
    pub block_enrichment: bool,
}

/// Analyzer bound to one immutable configuration.
#[derive(Debug, Clone)]
pub struct ConfidenceAnalyzer {
    high: f64,
    medium: f64,
    top_n: usize,
    taxonomy: LabelTaxonomy,
}

impl ConfidenceAnalyzer {
    #[must_use]
    pub fn new(thresholds: &ThresholdConfig, taxonomy: LabelTaxonomy) -> Self {
        Self {
            high: thresholds.high,
            medium: thresholds.medium,
            top_n: thresholds.top_n,
            taxonomy,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let taxonomy = LabelTaxonomy::from_config(&config.labels)?;
        Ok(Self::new(&config.thresholds, taxonomy))
    }

    #[must_use]
    pub fn taxonomy(&self) -> &LabelTaxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub fn tier_for(&self, score: f64) -> ConfidenceTier {
        ConfidenceTier::from_score(score, self.high, self.medium)
    }

    /// Turn ranked results into a verdict.
    ///
    /// Fails with `InvalidInput` when the results are empty, unsorted,
    /// contain duplicate labels or out-of-range scores, or name a label
    /// outside the configured vocabulary.
    pub fn analyze(&self, results: &[RankedResult]) -> Result<AnalysisReport> {
        validate_ranked(results)?;
        if let Some(unknown) = results
            .iter()
            .find(|result| self.taxonomy.class_of(&result.label).is_none())
        {
            return Err(BevError::InvalidInput {
                details: format!("label {:?} is not in the candidate vocabulary", unknown.label),
            });
        }

        let top = &results[0];
        let is_alcohol = self.taxonomy.is_alcohol(&top.label);
        let false_negative_risk = self.taxonomy.is_non_alcohol(&top.label);
        let tier = self.tier_for(top.score);
        let (message, severity) = select_message(tier, is_alcohol, false_negative_risk);

        Ok(AnalysisReport {
            top_label: top.label.clone(),
            top_score: top.score,
            confidence_tier: tier,
            is_alcohol,
            false_negative_risk,
            top_n: results[..self.top_n.min(results.len())].to_vec(),
            plain_message: message.to_string(),
            severity,
            block_enrichment: tier == ConfidenceTier::Low || false_negative_risk,
        })
    }
}

/// Pick the banner text and severity. First match wins, and false-negative
/// risk outranks every tier.
#[must_use]
pub const fn select_message(
    tier: ConfidenceTier,
    is_alcohol: bool,
    false_negative_risk: bool,
) -> (&'static str, Severity) {
    if false_negative_risk {
        return (FALSE_NEGATIVE_MESSAGE, Severity::Danger);
    }
    match tier {
        ConfidenceTier::High if is_alcohol => (CONFIDENT_ALCOHOL_MESSAGE, Severity::Ok),
        ConfidenceTier::High => (CONFIDENT_NON_ALCOHOL_MESSAGE, Severity::Ok),
        ConfidenceTier::Medium => (CONFIRM_MESSAGE, Severity::Caution),
        ConfidenceTier::Low => (UNCERTAIN_MESSAGE, Severity::Danger),
    }
}

//! Ranked classifier output: the label/score pairs every port hands back.

#![allow(missing_docs)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::errors::{BevError, Result};

/// One candidate label with its model score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub label: String,
    pub score: f64,
}

impl RankedResult {
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Ordered classifier output, best candidate first.
pub type RankedResults = Vec<RankedResult>;

/// Check the shape every consumer relies on: non-empty, each score in
/// `[0, 1]`, labels distinct, and scores non-ascending.
pub fn validate_ranked(results: &[RankedResult]) -> Result<()> {
    if results.is_empty() {
        return Err(invalid("classifier returned no candidates"));
    }

    let mut seen = HashSet::with_capacity(results.len());
    for (idx, result) in results.iter().enumerate() {
        if !(0.0..=1.0).contains(&result.score) {
            return Err(invalid(format!(
                "score {} for {:?} is outside [0, 1]",
                result.score, result.label
            )));
        }
        if !seen.insert(result.label.as_str()) {
            return Err(invalid(format!("label {:?} appears twice", result.label)));
        }
        if idx > 0 && result.score > results[idx - 1].score {
            return Err(invalid(format!(
                "results are not sorted: {:?} ({}) ranks below {:?} ({})",
                result.label,
                result.score,
                results[idx - 1].label,
                results[idx - 1].score
            )));
        }
    }
    Ok(())
}

/// Sort `(label, score)` pairs best-first. The sort is stable, so tied
/// scores keep the order they were supplied in.
#[must_use]
pub fn rank_scores<I, S>(pairs: I) -> RankedResults
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let mut ranked: RankedResults = pairs
        .into_iter()
        .map(|(label, score)| RankedResult::new(label, score))
        .collect();
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
    ranked
}

/// Softmax raw per-label logits into probabilities and rank them.
///
/// `labels` and `logits` must be aligned one-to-one, as image/text
/// similarity models emit one logit per candidate prompt.
pub fn rank_logits(labels: &[String], logits: &[f64]) -> Result<RankedResults> {
    if labels.len() != logits.len() {
        return Err(BevError::Classification {
            reason: format!(
                "model produced {} logits for {} candidate labels",
                logits.len(),
                labels.len()
            ),
        });
    }
    if logits.is_empty() {
        return Err(BevError::Classification {
            reason: "model produced no logits".to_string(),
        });
    }
    if let Some(bad) = logits.iter().find(|logit| !logit.is_finite()) {
        return Err(BevError::Classification {
            reason: format!("model produced a non-finite logit ({bad})"),
        });
    }

    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let total: f64 = exps.iter().sum();

    Ok(rank_scores(
        labels
            .iter()
            .zip(exps)
            .map(|(label, exp)| (label.clone(), (exp / total).clamp(0.0, 1.0))),
    ))
}

fn invalid(details: impl Into<String>) -> BevError {
    BevError::InvalidInput {
        details: details.into(),
    }
}

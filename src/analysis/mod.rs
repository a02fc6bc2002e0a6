//! Confidence-tiered decision pipeline: ranked results and the analyzer that
//! turns them into a risk verdict.

pub mod analyzer;
pub mod ranked;

pub use analyzer::{AnalysisReport, ConfidenceAnalyzer, ConfidenceTier, Severity};
pub use ranked::{RankedResult, RankedResults, rank_logits, rank_scores, validate_ranked};

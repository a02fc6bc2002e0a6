//! Per-session state for the six-step identification flow.
//!
//! [`SessionState`] is the single mutable entity of a session. Its fields are
//! only written by [`super::update`]; everything else reads through the
//! accessors or a [`SessionSnapshot`].

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisReport, ConfidenceTier, RankedResults};
use crate::ports::image::{ImagePayload, ImageSummary};

// ──────────────────── steps ────────────────────

/// Steps of the flow, in the order a user normally meets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Upload,
    Classify,
    Review,
    Decide,
    Enrich,
    Result,
}

impl Step {
    pub const ALL: [Self; 6] = [
        Self::Upload,
        Self::Classify,
        Self::Review,
        Self::Decide,
        Self::Enrich,
        Self::Result,
    ];

    /// 1-based position used by progress displays.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::Classify => 2,
            Self::Review => 3,
            Self::Decide => 4,
            Self::Enrich => 5,
            Self::Result => 6,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Classify => "Classify",
            Self::Review => "Review",
            Self::Decide => "Decide",
            Self::Enrich => "Enrich",
            Self::Result => "Result",
        }
    }
}

/// What the user said about the top prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDecision {
    Accept,
    Flag,
}

// ──────────────────── state ────────────────────

/// Everything one user's traversal of the flow knows.
///
/// `Default` is the initial state: step `Upload`, every other field empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub(super) step: Step,
    pub(super) image: Option<ImagePayload>,
    pub(super) results: Option<RankedResults>,
    pub(super) report: Option<AnalysisReport>,
    pub(super) user_decision: Option<UserDecision>,
    pub(super) enrichment_text: Option<String>,
    pub(super) error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub const fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> Option<&RankedResults> {
        self.results.as_ref()
    }

    #[must_use]
    pub const fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub const fn user_decision(&self) -> Option<UserDecision> {
        self.user_decision
    }

    #[must_use]
    pub fn enrichment_text(&self) -> Option<&str> {
        self.enrichment_text.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True when the state equals a freshly created session.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }

    /// Flat, serializable view with the report fields hoisted to the top level.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let report = self.report.as_ref();
        SessionSnapshot {
            step: self.step,
            image: self.image.as_ref().map(ImagePayload::summary),
            results: self.results.clone(),
            top_label: report.map(|r| r.top_label.clone()),
            top_score: report.map(|r| r.top_score),
            confidence_tier: report.map(|r| r.confidence_tier),
            is_alcohol: report.map(|r| r.is_alcohol),
            false_negative_risk: report.map(|r| r.false_negative_risk),
            top_n: report.map(|r| r.top_n.clone()),
            plain_message: report.map(|r| r.plain_message.clone()),
            block_enrichment: report.is_some_and(|r| r.block_enrichment),
            user_decision: self.user_decision,
            enrichment_text: self.enrichment_text.clone(),
            error: self.error.clone(),
        }
    }
}

/// Session schema used for persistence-style dumps and assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub step: Step,
    pub image: Option<ImageSummary>,
    pub results: Option<RankedResults>,
    pub top_label: Option<String>,
    pub top_score: Option<f64>,
    pub confidence_tier: Option<ConfidenceTier>,
    pub is_alcohol: Option<bool>,
    pub false_negative_risk: Option<bool>,
    pub top_n: Option<RankedResults>,
    pub plain_message: Option<String>,
    pub block_enrichment: bool,
    pub user_decision: Option<UserDecision>,
    pub enrichment_text: Option<String>,
    pub error: Option<String>,
}

//! Transition function for the identification flow.
//!
//! `update` is pure: it never calls a port. Steps that need the classifier
//! or the enrichment generator return a [`FlowCmd`]; the runtime performs the
//! call and feeds the outcome back as a [`FlowMsg`].
//!
//! An event that is not valid for the current step is a contract violation.
//! It is reported as `InvalidTransition` and leaves the state untouched.

#![allow(missing_docs)]

use super::session::{SessionState, Step, UserDecision};
use crate::analysis::{ConfidenceAnalyzer, RankedResults};
use crate::core::errors::{BevError, Result};
use crate::ports::image::ImagePayload;

/// Text shown in place of enrichment when the gate blocks it.
pub const WITHHELD_NOTICE: &str = "Detailed information is unavailable because the model confidence is too low \
     or the beverage may not be alcoholic. Please check the physical label.";

/// Text shown in place of enrichment when the generator failed.
#[must_use]
pub fn enrichment_unavailable(reason: &str) -> String {
    format!(
        "Detailed information could not be generated right now ({reason}). \
         The classification above is still valid; check the physical label for details."
    )
}

// ──────────────────── messages ────────────────────

/// The six events a view can report.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    SubmitImage(ImagePayload),
    Continue,
    Accept,
    FlagUncertain,
    TryAnotherPhoto,
    Restart,
}

impl FlowEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SubmitImage(_) => "submit_image",
            Self::Continue => "continue",
            Self::Accept => "accept",
            Self::FlagUncertain => "flag_uncertain",
            Self::TryAnotherPhoto => "try_another_photo",
            Self::Restart => "restart",
        }
    }
}

/// Inputs to [`update`]: user events, port outcomes, and the unconditional reset.
#[derive(Debug)]
pub enum FlowMsg {
    User(FlowEvent),
    ClassifyFinished(Result<RankedResults>),
    EnrichFinished(Result<String>),
    Reset,
}

impl FlowMsg {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::User(event) => event.name(),
            Self::ClassifyFinished(_) => "classify_finished",
            Self::EnrichFinished(_) => "enrich_finished",
            Self::Reset => "reset",
        }
    }
}

/// Port work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowCmd {
    None,
    Classify(ImagePayload),
    Enrich { label: String, confidence: f64 },
}

// ──────────────────── transitions ────────────────────

/// Clear every field back to the initial state. Valid from any step.
pub fn reset(state: &mut SessionState) {
    *state = SessionState::default();
}

/// Apply one message to the session.
pub fn update(
    state: &mut SessionState,
    msg: FlowMsg,
    analyzer: &ConfidenceAnalyzer,
) -> Result<FlowCmd> {
    match (state.step, msg) {
        (_, FlowMsg::Reset) => {
            reset(state);
            Ok(FlowCmd::None)
        }

        (Step::Upload, FlowMsg::User(FlowEvent::SubmitImage(image))) => {
            state.step = Step::Classify;
            state.image = Some(image.clone());
            state.error = None;
            Ok(FlowCmd::Classify(image))
        }

        (Step::Classify, FlowMsg::ClassifyFinished(outcome)) => {
            match outcome.and_then(|results| {
                let report = analyzer.analyze(&results)?;
                Ok((results, report))
            }) {
                Ok((results, report)) => {
                    state.step = Step::Review;
                    state.results = Some(results);
                    state.report = Some(report);
                    state.error = None;
                }
                Err(err) => {
                    // The attempt is consumed: a fresh image is required.
                    tracing::warn!(code = err.code(), error = %err, "classification failed");
                    state.step = Step::Upload;
                    state.image = None;
                    state.results = None;
                    state.report = None;
                    state.error = Some(err.user_message());
                }
            }
            Ok(FlowCmd::None)
        }

        (Step::Review, FlowMsg::User(FlowEvent::Continue)) => {
            state.step = Step::Decide;
            Ok(FlowCmd::None)
        }

        (Step::Decide, FlowMsg::User(FlowEvent::Accept)) => {
            let Some(report) = state.report.as_ref() else {
                return Err(BevError::Runtime {
                    details: "session reached Decide without an analysis report".to_string(),
                });
            };
            // The gate is read here and nowhere else.
            let cmd = if report.block_enrichment {
                FlowCmd::None
            } else {
                FlowCmd::Enrich {
                    label: report.top_label.clone(),
                    confidence: report.top_score,
                }
            };
            state.user_decision = Some(UserDecision::Accept);
            if cmd == FlowCmd::None {
                state.step = Step::Result;
                state.enrichment_text = Some(WITHHELD_NOTICE.to_string());
            } else {
                state.step = Step::Enrich;
            }
            Ok(cmd)
        }

        (Step::Decide, FlowMsg::User(FlowEvent::FlagUncertain)) => {
            state.step = Step::Review;
            state.user_decision = Some(UserDecision::Flag);
            Ok(FlowCmd::None)
        }

        (Step::Decide, FlowMsg::User(FlowEvent::TryAnotherPhoto))
        | (Step::Result, FlowMsg::User(FlowEvent::Restart)) => {
            reset(state);
            Ok(FlowCmd::None)
        }

        (Step::Enrich, FlowMsg::EnrichFinished(outcome)) => {
            state.step = Step::Result;
            match outcome {
                Ok(text) => state.enrichment_text = Some(text),
                Err(err) => {
                    tracing::warn!(code = err.code(), error = %err, "enrichment failed");
                    let reason = err.user_message();
                    state.enrichment_text = Some(enrichment_unavailable(&reason));
                    state.error = Some(reason);
                }
            }
            Ok(FlowCmd::None)
        }

        (step, msg) => Err(BevError::InvalidTransition {
            step: step.label(),
            event: msg.name(),
        }),
    }
}

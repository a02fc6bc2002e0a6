//! Beverage identifier: a confidence-tiered decision pipeline over an image
//! classifier, wrapped in a six-step user flow.
//!
//! The analyzer in [`analysis`] turns ranked classifier scores into a verdict
//! that flags false-negative risk ("no alcohol" when the model is not sure)
//! and gates downstream enrichment. [`flow`] owns per-session state and the
//! transition function; [`ports`] holds the classifier and enrichment
//! collaborators; [`logger`] journals decisions.

pub mod analysis;
pub mod core;
pub mod flow;
pub mod logger;
pub mod ports;

#[cfg(feature = "cli")]
pub mod cli_app;
#[cfg(feature = "cli")]
pub mod view;


pub use crate::analysis::{AnalysisReport, ConfidenceAnalyzer, ConfidenceTier, RankedResult};
pub use crate::core::config::Config;
pub use crate::core::errors::{BevError, Result};
pub use crate::flow::{FlowEvent, FlowServices, Session, SessionState, Step};

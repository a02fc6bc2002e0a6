//! Classifier port and the process-wide lazily initialised model.
//!
//! The pipeline only ever sees [`Classifier`]. How and when the underlying
//! model is built is hidden behind [`SharedModel`], which runs the expensive
//! [`ModelLoader::load`] at most once per successful initialisation. Callers
//! that race on first use block on the init lock and then share the same
//! instance read-only.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Deserialize;

use super::command::ExternalCommand;
use super::image::ImagePayload;
use crate::analysis::ranked::{RankedResult, RankedResults, rank_logits, rank_scores};
use crate::core::errors::{BevError, Result};

/// Image in, ranked candidate labels out (best first).
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &ImagePayload) -> Result<RankedResults>;
}

/// Builds the model behind a [`SharedModel`].
pub trait ModelLoader: Send + Sync {
    type Model: Classifier;

    fn load(&self) -> Result<Self::Model>;

    /// Name used in log lines.
    fn describe(&self) -> String;
}

/// Lazily constructed, shared-read-only classification model.
pub struct SharedModel<L: ModelLoader> {
    loader: L,
    model: OnceLock<L::Model>,
    init_lock: Mutex<()>,
    loads: AtomicUsize,
}

impl<L: ModelLoader> SharedModel<L> {
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the model, building it on first use.
    ///
    /// A failed load is not cached; the next caller tries again.
    pub fn get(&self) -> Result<&L::Model> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let _guard = self.init_lock.lock();
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        tracing::info!(model = %self.loader.describe(), "initialising classification model");
        self.loads.fetch_add(1, Ordering::SeqCst);
        let model = self.loader.load().map_err(|err| {
            tracing::warn!(error = %err, "classification model failed to initialise");
            match err {
                err @ BevError::Classification { .. } => err,
                other => BevError::Classification {
                    reason: format!("model initialisation failed: {other}"),
                },
            }
        })?;
        Ok(self.model.get_or_init(|| model))
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// How many times the loader has been invoked (including failures).
    #[must_use]
    pub fn load_attempts(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<L: ModelLoader> Classifier for SharedModel<L> {
    fn classify(&self, image: &ImagePayload) -> Result<RankedResults> {
        self.get()?.classify(image)
    }
}

// ──────────────────── fixture backend ────────────────────

/// Canned scores keyed by image digest, with an optional catch-all entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureScores {
    #[serde(default)]
    pub default: Option<Vec<RankedResult>>,
    #[serde(default)]
    pub by_digest: HashMap<String, Vec<RankedResult>>,
}

/// Classifier that replays recorded scores. Used for demos, offline
/// review of stored verdicts, and tests.
#[derive(Debug, Clone, Default)]
pub struct FixtureClassifier {
    scores: FixtureScores,
}

impl FixtureClassifier {
    #[must_use]
    pub fn new(scores: FixtureScores) -> Self {
        Self { scores }
    }

    /// Same scores for every image.
    #[must_use]
    pub fn constant(results: Vec<RankedResult>) -> Self {
        Self::new(FixtureScores {
            default: Some(results),
            by_digest: HashMap::new(),
        })
    }
}

impl Classifier for FixtureClassifier {
    fn classify(&self, image: &ImagePayload) -> Result<RankedResults> {
        let recorded = self
            .scores
            .by_digest
            .get(image.digest())
            .or(self.scores.default.as_ref())
            .ok_or_else(|| BevError::Classification {
                reason: format!("no recorded scores for image {}", image.digest()),
            })?;
        Ok(rank_scores(
            recorded.iter().map(|r| (r.label.clone(), r.score)),
        ))
    }
}

/// Reads a fixture JSON file once.
///
/// With no path there is nothing to replay: every classification fails
/// inside the flow and the session returns to Upload with the reason.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    pub path: Option<PathBuf>,
}

/// Reason reported when the fixture backend has no scores file.
pub const NO_FIXTURE_REASON: &str =
    "no classifier configured: set model.fixture_path or model.backend = \"command\"";

impl ModelLoader for FixtureLoader {
    type Model = FixtureClassifier;

    fn load(&self) -> Result<Self::Model> {
        let Some(path) = &self.path else {
            return Err(BevError::Classification {
                reason: NO_FIXTURE_REASON.to_string(),
            });
        };
        let raw = std::fs::read_to_string(path).map_err(|source| BevError::io(path, source))?;
        let scores: FixtureScores = serde_json::from_str(&raw)?;
        Ok(FixtureClassifier::new(scores))
    }

    fn describe(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "fixture:<none>".to_string(), |p| format!("fixture:{}", p.display()))
    }
}

// ──────────────────── command backend ────────────────────

/// What a command classifier may print: ranked pairs, or raw logits aligned
/// with the candidate vocabulary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandOutput {
    Ranked(Vec<RankedResult>),
    Logits { logits: Vec<f64> },
}

/// Classifier backed by an external inference program.
///
/// The image bytes go to stdin; the candidate labels (JSON array) and model
/// id are passed in `BEVID_CANDIDATE_LABELS` and `BEVID_MODEL_ID`.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    command: ExternalCommand,
    labels: Vec<String>,
}

impl CommandClassifier {
    pub fn new(command: ExternalCommand, model_id: &str, labels: Vec<String>) -> Result<Self> {
        let encoded = serde_json::to_string(&labels)?;
        Ok(Self {
            command: command
                .env("BEVID_CANDIDATE_LABELS", encoded)
                .env("BEVID_MODEL_ID", model_id),
            labels,
        })
    }
}

impl Classifier for CommandClassifier {
    fn classify(&self, image: &ImagePayload) -> Result<RankedResults> {
        let stdout = self
            .command
            .run(image.bytes())
            .map_err(|reason| BevError::Classification { reason })?;
        let parsed: CommandOutput =
            serde_json::from_str(stdout.trim()).map_err(|err| BevError::Classification {
                reason: format!("unreadable classifier output: {err}"),
            })?;
        match parsed {
            CommandOutput::Ranked(results) => Ok(rank_scores(
                results.into_iter().map(|r| (r.label, r.score)),
            )),
            CommandOutput::Logits { logits } => rank_logits(&self.labels, &logits),
        }
    }
}

/// Builds a [`CommandClassifier`]; kept behind [`SharedModel`] so the
/// command and vocabulary are resolved once.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    pub command: ExternalCommand,
    pub model_id: String,
    pub labels: Vec<String>,
}

impl ModelLoader for CommandLoader {
    type Model = CommandClassifier;

    fn load(&self) -> Result<Self::Model> {
        if self.command.program.trim().is_empty() {
            return Err(BevError::InvalidConfig {
                details: "classifier command is empty".to_string(),
            });
        }
        CommandClassifier::new(self.command.clone(), &self.model_id, self.labels.clone())
    }

    fn describe(&self) -> String {
        format!("command:{} ({})", self.command.program, self.model_id)
    }
}

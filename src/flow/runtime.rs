//! Session runtime: the bridge between the pure transition function and the
//! ports.
//!
//! [`FlowServices`] is built once per process and shared by every session.
//! A [`Session`] owns one [`SessionState`], feeds events through
//! [`update`](super::update::update), and executes the commands it returns.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;

use super::session::SessionState;
use super::update::{self, FlowCmd, FlowEvent, FlowMsg};
use crate::analysis::ConfidenceAnalyzer;
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::logger::{DecisionJournal, JournalEntry};
use crate::ports::deadline::call_with_deadline;
use crate::ports::{self, Classifier, Enricher};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

// ──────────────────── shared services ────────────────────

/// Read-only collaborators shared across sessions.
pub struct FlowServices {
    analyzer: ConfidenceAnalyzer,
    classifier: Arc<dyn Classifier>,
    enricher: Arc<dyn Enricher>,
    classify_timeout: Option<Duration>,
    enrich_timeout: Option<Duration>,
    journal: Option<Arc<DecisionJournal>>,
}

impl std::fmt::Debug for FlowServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowServices")
            .field("analyzer", &self.analyzer)
            .field("classify_timeout", &self.classify_timeout)
            .field("enrich_timeout", &self.enrich_timeout)
            .field("journal", &self.journal.as_ref().map(|j| j.path().to_path_buf()))
            .finish_non_exhaustive()
    }
}

impl FlowServices {
    /// Services with no timeouts and no journal.
    #[must_use]
    pub fn new(
        analyzer: ConfidenceAnalyzer,
        classifier: Arc<dyn Classifier>,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            analyzer,
            classifier,
            enricher,
            classify_timeout: None,
            enrich_timeout: None,
            journal: None,
        }
    }

    /// Wire every port from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let journal = if config.journal.enabled {
            Some(Arc::new(DecisionJournal::open(&config.journal.path)?))
        } else {
            None
        };
        Ok(Self {
            analyzer: ConfidenceAnalyzer::from_config(config)?,
            classifier: ports::build_classifier(config)?,
            enricher: ports::build_enricher(config)?,
            classify_timeout: config.model.classify_timeout(),
            enrich_timeout: config.enrichment.timeout(),
            journal,
        })
    }

    #[must_use]
    pub const fn with_timeouts(
        mut self,
        classify: Option<Duration>,
        enrich: Option<Duration>,
    ) -> Self {
        self.classify_timeout = classify;
        self.enrich_timeout = enrich;
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Arc<DecisionJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    #[must_use]
    pub const fn analyzer(&self) -> &ConfidenceAnalyzer {
        &self.analyzer
    }
}

// ──────────────────── session ────────────────────

/// One user's traversal of the flow.
#[derive(Debug)]
pub struct Session {
    id: u64,
    services: Arc<FlowServices>,
    state: SessionState,
}

impl Session {
    #[must_use]
    pub fn new(services: Arc<FlowServices>) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            services,
            state: SessionState::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply a user event and run any port work it triggers.
    ///
    /// Port failures never surface here: they are folded into the state.
    /// An `Err` means the event was not valid for the current step.
    pub fn dispatch(&mut self, event: FlowEvent) -> Result<&SessionState> {
        self.apply(FlowMsg::User(event))?;
        Ok(&self.state)
    }

    /// Unconditional return to the initial state.
    pub fn reset(&mut self) {
        // Reset is valid from every step.
        if let Err(err) = self.apply(FlowMsg::Reset) {
            tracing::error!(session = self.id, error = %err, "reset rejected");
            update::reset(&mut self.state);
        }
    }

    fn apply(&mut self, msg: FlowMsg) -> Result<()> {
        let from = self.state.step();
        let event = msg.name();
        let cmd = update::update(&mut self.state, msg, &self.services.analyzer)?;
        tracing::debug!(
            session = self.id,
            event,
            from = from.label(),
            to = self.state.step().label(),
            "transition"
        );
        if let Some(journal) = &self.services.journal {
            journal.append(&JournalEntry::transition(
                Utc::now(),
                self.id,
                event,
                from,
                &self.state,
            ));
        }
        self.execute(cmd)
    }

    fn execute(&mut self, cmd: FlowCmd) -> Result<()> {
        match cmd {
            FlowCmd::None => Ok(()),
            FlowCmd::Classify(image) => {
                let classifier = Arc::clone(&self.services.classifier);
                let outcome = call_with_deadline("classifier", self.services.classify_timeout, move || {
                    classifier.classify(&image)
                });
                self.apply(FlowMsg::ClassifyFinished(outcome))
            }
            FlowCmd::Enrich { label, confidence } => {
                let enricher = Arc::clone(&self.services.enricher);
                let outcome = call_with_deadline("enrichment", self.services.enrich_timeout, move || {
                    enricher.enrich(&label, confidence)
                });
                self.apply(FlowMsg::EnrichFinished(outcome))
            }
        }
    }
}

// ──────────────────── view port ────────────────────

/// What a view asks the runtime to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    Event(FlowEvent),
    StartOver,
    Quit,
}

/// Presentation layer: shows state and reports user intent.
pub trait ViewPort {
    fn render(&mut self, state: &SessionState) -> Result<()>;

    /// Next user intent, or `None` when input is exhausted.
    fn next_action(&mut self, state: &SessionState) -> Result<Option<ViewAction>>;
}

/// Drive `session` with `view` until the view quits or runs dry.
pub fn run_view(session: &mut Session, view: &mut dyn ViewPort) -> Result<()> {
    loop {
        view.render(session.state())?;
        match view.next_action(session.state())? {
            None | Some(ViewAction::Quit) => return Ok(()),
            Some(ViewAction::StartOver) => session.reset(),
            Some(ViewAction::Event(event)) => {
                session.dispatch(event)?;
            }
        }
    }
}

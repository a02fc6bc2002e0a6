//! End-to-end flow scenarios through the public session API.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use beverage_identifier::analysis::{RankedResult, RankedResults, Severity};
use beverage_identifier::flow::{UserDecision, WITHHELD_NOTICE};
use beverage_identifier::logger::jsonl::read_entries;
use beverage_identifier::logger::DecisionJournal;
use beverage_identifier::ports::{Classifier, Enricher, FixtureClassifier, ImagePayload, PlaceholderEnricher};
use beverage_identifier::{
    BevError, Config, ConfidenceAnalyzer, ConfidenceTier, FlowEvent, FlowServices, Result, Session,
    Step,
};

fn analyzer() -> ConfidenceAnalyzer {
    ConfidenceAnalyzer::from_config(&Config::default()).unwrap()
}

fn image() -> ImagePayload {
    ImagePayload::from_bytes(common::PNG).unwrap()
}

fn ranked(pairs: &[(&str, f64)]) -> RankedResults {
    pairs.iter().map(|(l, s)| RankedResult::new(*l, *s)).collect()
}

struct CountingEnricher {
    calls: AtomicUsize,
}

impl Enricher for CountingEnricher {
    fn enrich(&self, label: &str, confidence: f64) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{label} at {confidence:.2}"))
    }
}

struct FailingEnricher;

impl Enricher for FailingEnricher {
    fn enrich(&self, _label: &str, _confidence: f64) -> Result<String> {
        Err(BevError::Enrichment {
            reason: "rate limited".into(),
        })
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _image: &ImagePayload) -> Result<RankedResults> {
        Err(BevError::Classification {
            reason: "CUDA out of memory".into(),
        })
    }
}

struct SlowClassifier(Duration);

impl Classifier for SlowClassifier {
    fn classify(&self, _image: &ImagePayload) -> Result<RankedResults> {
        std::thread::sleep(self.0);
        Ok(ranked(&[("a bottle of beer", 0.9)]))
    }
}

fn session_with(classifier: Arc<dyn Classifier>, enricher: Arc<dyn Enricher>) -> Session {
    Session::new(Arc::new(FlowServices::new(analyzer(), classifier, enricher)))
}

fn fixture(pairs: &[(&str, f64)]) -> Arc<dyn Classifier> {
    Arc::new(FixtureClassifier::constant(ranked(pairs)))
}

#[test]
fn scenario_confident_beer_is_enriched() {
    let enricher = Arc::new(CountingEnricher {
        calls: AtomicUsize::new(0),
    });
    let mut session = session_with(
        fixture(&[
            ("a bottle of beer", 0.91),
            ("a can of beer", 0.05),
            ("a glass of red wine", 0.02),
        ]),
        enricher.clone(),
    );

    let state = session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    assert_eq!(state.step(), Step::Review);
    let report = state.report().unwrap();
    assert_eq!(report.confidence_tier, ConfidenceTier::High);
    assert!(report.is_alcohol);
    assert!(!report.block_enrichment);

    session.dispatch(FlowEvent::Continue).unwrap();
    let state = session.dispatch(FlowEvent::Accept).unwrap();
    assert_eq!(state.step(), Step::Result);
    assert_eq!(state.enrichment_text(), Some("a bottle of beer at 0.91"));
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn scenario_uncertain_soft_drink_is_withheld() {
    let enricher = Arc::new(CountingEnricher {
        calls: AtomicUsize::new(0),
    });
    let mut session = session_with(
        fixture(&[
            ("a soft drink, juice, or water", 0.52),
            ("a bottle of beer", 0.30),
        ]),
        enricher.clone(),
    );

    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    let report = session.state().report().unwrap().clone();
    assert!(report.false_negative_risk);
    assert_eq!(report.severity, Severity::Danger);
    assert!(report.block_enrichment);

    session.dispatch(FlowEvent::Continue).unwrap();
    let state = session.dispatch(FlowEvent::Accept).unwrap();
    assert_eq!(state.step(), Step::Result);
    assert_eq!(state.enrichment_text(), Some(WITHHELD_NOTICE));
    assert_eq!(state.user_decision(), Some(UserDecision::Accept));
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_medium_gin_is_enriched_with_caution() {
    let mut session = session_with(
        fixture(&[("a bottle of gin", 0.70), ("a bottle of vodka", 0.20)]),
        Arc::new(PlaceholderEnricher),
    );
    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    let report = session.state().report().unwrap();
    assert_eq!(report.confidence_tier, ConfidenceTier::Medium);
    assert_eq!(report.severity, Severity::Caution);
    assert!(!report.block_enrichment);
}

#[test]
fn flag_then_accept_keeps_the_same_report() {
    let mut session = session_with(
        fixture(&[("a glass of sake", 0.88)]),
        Arc::new(PlaceholderEnricher),
    );
    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    let first = session.state().report().cloned();
    session.dispatch(FlowEvent::Continue).unwrap();
    let state = session.dispatch(FlowEvent::FlagUncertain).unwrap();
    assert_eq!(state.step(), Step::Review);
    assert_eq!(state.user_decision(), Some(UserDecision::Flag));
    session.dispatch(FlowEvent::Continue).unwrap();
    let state = session.dispatch(FlowEvent::Accept).unwrap();
    assert_eq!(state.report().cloned(), first);
    assert_eq!(state.user_decision(), Some(UserDecision::Accept));
}

#[test]
fn classifier_failure_returns_to_upload_and_allows_retry() {
    let mut session = session_with(Arc::new(FailingClassifier), Arc::new(PlaceholderEnricher));
    let state = session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    assert_eq!(state.step(), Step::Upload);
    assert!(state.results().is_none());
    assert!(state.error().unwrap().contains("CUDA out of memory"));

    let state = session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    assert_eq!(state.step(), Step::Upload);
}

#[test]
fn enrichment_failure_still_reaches_result() {
    let mut session = session_with(
        fixture(&[("a bottle of rum", 0.95)]),
        Arc::new(FailingEnricher),
    );
    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    session.dispatch(FlowEvent::Continue).unwrap();
    let state = session.dispatch(FlowEvent::Accept).unwrap();
    assert_eq!(state.step(), Step::Result);
    assert!(state.enrichment_text().unwrap().contains("rate limited"));
    assert!(state.error().is_some());
    assert_eq!(state.report().unwrap().top_label, "a bottle of rum");
}

#[test]
fn slow_classifier_times_out_to_upload() {
    let services = FlowServices::new(
        analyzer(),
        Arc::new(SlowClassifier(Duration::from_millis(500))),
        Arc::new(PlaceholderEnricher),
    )
    .with_timeouts(Some(Duration::from_millis(50)), None);
    let mut session = Session::new(Arc::new(services));
    let state = session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    assert_eq!(state.step(), Step::Upload);
    assert!(state.error().unwrap().contains("classifier"));
}

#[test]
fn try_another_photo_and_restart_reset_everything() {
    let mut session = session_with(
        fixture(&[("a bottle of tequila", 0.9)]),
        Arc::new(PlaceholderEnricher),
    );
    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    session.dispatch(FlowEvent::Continue).unwrap();
    assert!(session.dispatch(FlowEvent::TryAnotherPhoto).unwrap().is_initial());

    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    session.dispatch(FlowEvent::Continue).unwrap();
    session.dispatch(FlowEvent::Accept).unwrap();
    assert!(session.dispatch(FlowEvent::Restart).unwrap().is_initial());
}

#[test]
fn start_over_works_mid_flow() {
    let mut session = session_with(
        fixture(&[("a glass of champagne", 0.9)]),
        Arc::new(PlaceholderEnricher),
    );
    session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
    session.reset();
    assert!(session.state().is_initial());
    session.reset();
    assert!(session.state().is_initial());
}

#[test]
fn invalid_events_are_contract_violations() {
    let mut session = session_with(
        fixture(&[("a bottle of beer", 0.9)]),
        Arc::new(PlaceholderEnricher),
    );
    for event in [
        FlowEvent::Continue,
        FlowEvent::Accept,
        FlowEvent::FlagUncertain,
        FlowEvent::TryAnotherPhoto,
        FlowEvent::Restart,
    ] {
        let err = session.dispatch(event).unwrap_err();
        assert_eq!(err.code(), "BEV-3001");
        assert!(!err.is_recoverable());
    }
    assert!(session.state().is_initial());
}

#[test]
fn concurrent_sessions_share_one_model_and_journal() {
    let tmp = tempfile::TempDir::new().unwrap();
    let journal = Arc::new(DecisionJournal::open(tmp.path().join("journal.jsonl")).unwrap());
    let services = Arc::new(
        FlowServices::new(
            analyzer(),
            fixture(&[("a bottle of white wine", 0.87)]),
            Arc::new(PlaceholderEnricher),
        )
        .with_journal(Arc::clone(&journal)),
    );

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let services = Arc::clone(&services);
            std::thread::spawn(move || {
                let mut session = Session::new(services);
                session.dispatch(FlowEvent::SubmitImage(image())).unwrap();
                session.dispatch(FlowEvent::Continue).unwrap();
                session.dispatch(FlowEvent::Accept).unwrap();
                assert_eq!(session.state().step(), Step::Result);
                session.id()
            })
        })
        .collect();
    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 6);

    // submit, classify, continue, accept, enrich per session
    let entries = read_entries(journal.path()).unwrap();
    assert_eq!(entries.len(), 30);
    for id in ids {
        let mine: Vec<_> = entries.iter().filter(|e| e.session == id).collect();
        assert_eq!(mine.len(), 5);
        assert_eq!(mine.last().unwrap().to, Step::Result);
    }
}

//! Frame renderer: one text screen per step.

#![allow(missing_docs)]

use std::fmt::Write as _;

use super::input::commands_for;
use super::theme::{SemanticToken, Theme};
use super::widgets::{banner, gauge, step_sidebar, wrap};
use crate::analysis::{AnalysisReport, ConfidenceAnalyzer, ConfidenceTier};
use crate::flow::{SessionState, Step};
use crate::ports::enrichment::percent;

const WIDTH: usize = 72;
const BAR_WIDTH: usize = 24;

pub const SAFETY_NOTICE: &str = "The model suggests this beverage may not contain alcohol, but predictions can be wrong. \
     Always check the physical label, especially if you are under 18 or need to avoid alcohol \
     for health or personal reasons. Look for ABV (alcohol by volume) on the bottle. \
     Any value above 0.5% ABV means the drink contains alcohol.";

pub const REVIEW_GATING_NOTICE: &str = "Because the model is not confident, detailed beverage information will not be shown. \
     Please verify using the physical label.";

pub const DECIDE_GATING_NOTICE: &str = "If you accept this prediction, detailed information will not be shown \
     because the model is not confident enough. You can still see the classification result.";

pub const RESULT_NON_ALCOHOL_WARNING: &str =
    "This beverage was predicted to be non-alcoholic. Verify with the physical label.";

/// Render the full frame for `state`.
#[must_use]
pub fn render(state: &SessionState, analyzer: &ConfidenceAnalyzer, theme: Theme) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", theme.strong("Beverage Identifier", SemanticToken::Accent));
    for line in step_sidebar(state.step(), theme) {
        let _ = writeln!(out, "  {line}");
    }
    let _ = writeln!(out, "{}", "─".repeat(WIDTH));

    if let Some(error) = state.error() {
        push_block(&mut out, &banner("ERROR", error, SemanticToken::Danger, theme));
        let _ = writeln!(out);
    }

    match (state.step(), state.report()) {
        (Step::Upload, _) => render_upload(&mut out),
        (Step::Classify, _) => render_classify(state, &mut out),
        (Step::Review, Some(report)) => render_review(report, analyzer, theme, &mut out),
        (Step::Decide, Some(report)) => render_decide(report, theme, &mut out),
        (Step::Enrich, Some(report)) => {
            let _ = writeln!(
                out,
                "Generating details for {} ...",
                theme.strong(&report.top_label, SemanticToken::Accent)
            );
        }
        (Step::Result, Some(report)) => render_result(state, report, theme, &mut out),
        (step, None) => {
            let _ = writeln!(out, "No analysis is available for step {}.", step.label());
        }
    }

    let _ = writeln!(out, "{}", "─".repeat(WIDTH));
    let commands: Vec<&str> = commands_for(state.step()).iter().map(|c| c.usage).collect();
    let _ = writeln!(
        out,
        "{}",
        theme.paint(&format!("Commands: {}", commands.join(" | ")), SemanticToken::Muted)
    );
    out
}

fn push_block(out: &mut String, text: &str) {
    for line in wrap(text, WIDTH) {
        let _ = writeln!(out, "{line}");
    }
}

fn render_upload(out: &mut String) {
    let _ = writeln!(out, "Upload a photo of a beverage (JPEG, PNG or WEBP).");
}

fn render_classify(state: &SessionState, out: &mut String) {
    match state.image() {
        Some(image) => {
            let summary = image.summary();
            let _ = writeln!(
                out,
                "Analyzing {} image ({} bytes, {}) ...",
                summary.format.mime_type(),
                summary.size_bytes,
                &summary.digest[..summary.digest.len().min(12)]
            );
        }
        None => {
            let _ = writeln!(out, "Analyzing image ...");
        }
    }
}

fn render_review(
    report: &AnalysisReport,
    analyzer: &ConfidenceAnalyzer,
    theme: Theme,
    out: &mut String,
) {
    let token = SemanticToken::for_severity(report.severity);
    let tag = if report.false_negative_risk {
        "CAUTION"
    } else {
        match report.confidence_tier {
            ConfidenceTier::High => "OK",
            ConfidenceTier::Medium => "CHECK",
            ConfidenceTier::Low => "UNSURE",
        }
    };
    push_block(out, &banner(tag, &report.plain_message, token, theme));
    let _ = writeln!(out);
    let _ = writeln!(out, "Top candidates");
    for candidate in &report.top_n {
        let tier = analyzer.tier_for(candidate.score);
        let _ = writeln!(
            out,
            "  {}",
            theme.strong(&candidate.label, SemanticToken::for_tier(tier))
        );
        let _ = writeln!(
            out,
            "    {}  {}",
            gauge(candidate.score, BAR_WIDTH),
            tier.describe()
        );
    }

    if report.false_negative_risk {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", theme.strong("Safety Notice", SemanticToken::Danger));
        push_block(out, SAFETY_NOTICE);
    }
    if report.block_enrichment {
        let _ = writeln!(out);
        push_block(out, &banner("INFO", REVIEW_GATING_NOTICE, SemanticToken::Accent, theme));
    }
}

fn render_decide(report: &AnalysisReport, theme: Theme, out: &mut String) {
    let _ = writeln!(out, "What would you like to do?");
    let _ = writeln!(
        out,
        "Top prediction: {} ({} confidence)",
        theme.strong(&report.top_label, SemanticToken::for_tier(report.confidence_tier)),
        percent(report.top_score)
    );
    if report.block_enrichment {
        let _ = writeln!(out);
        push_block(out, &banner("INFO", DECIDE_GATING_NOTICE, SemanticToken::Accent, theme));
    }
}

fn render_result(state: &SessionState, report: &AnalysisReport, theme: Theme, out: &mut String) {
    let _ = writeln!(out, "Beverage Information");
    let _ = writeln!(
        out,
        "{}",
        theme.strong(&report.top_label, SemanticToken::for_tier(report.confidence_tier))
    );
    let _ = writeln!(out, "Model confidence: {}", percent(report.top_score));
    if report.false_negative_risk {
        push_block(
            out,
            &banner("CAUTION", RESULT_NON_ALCOHOL_WARNING, SemanticToken::Danger, theme),
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Details");
    push_block(
        out,
        state.enrichment_text().unwrap_or("No information available."),
    );
}

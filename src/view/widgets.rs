//! Text widgets shared by every step screen.

#![allow(missing_docs)]

use super::theme::{SemanticToken, Theme};
use crate::flow::Step;

pub const DONE_MARK: &str = "[x]";
pub const CURRENT_MARK: &str = "[>]";
pub const PENDING_MARK: &str = "[ ]";

/// Render a horizontal gauge for a `0.0..=1.0` score with a percentage label.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gauge(score: f64, width: usize) -> String {
    let clamped = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    let filled = (clamped * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);

    format!(
        "[{}{}] {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(empty),
        clamped * 100.0,
    )
}

/// Progress column: done, current, and pending steps.
#[must_use]
pub fn step_sidebar(current: Step, theme: Theme) -> Vec<String> {
    Step::ALL
        .iter()
        .map(|&step| {
            let text = format!("Step {}: {}", step.number(), step.label());
            if step.number() < current.number() {
                theme.paint(&format!("{DONE_MARK} {text}"), SemanticToken::Muted)
            } else if step == current {
                theme.strong(&format!("{CURRENT_MARK} {text}"), SemanticToken::Accent)
            } else {
                format!("{PENDING_MARK} {text}")
            }
        })
        .collect()
}

/// Boxed banner with a leading tag, e.g. `[CAUTION] ...`.
#[must_use]
pub fn banner(tag: &str, message: &str, token: SemanticToken, theme: Theme) -> String {
    format!("{} {message}", theme.strong(&format!("[{tag}]"), token))
}

/// Greedy word wrap; words longer than `width` get their own line.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

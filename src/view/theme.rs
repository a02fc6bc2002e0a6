//! Semantic colors and the `NO_COLOR` accessibility hook for terminal output.

#![allow(missing_docs)]

use std::env;

use colored::{Color, Colorize};

use crate::analysis::{ConfidenceTier, Severity};

/// Color output mode for compatibility with `NO_COLOR` and `--no-color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Enabled,
    Disabled,
}

/// Accessibility knobs consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessibilityProfile {
    pub color: ColorMode,
}

impl Default for AccessibilityProfile {
    fn default() -> Self {
        Self {
            color: ColorMode::Enabled,
        }
    }
}

impl AccessibilityProfile {
    #[must_use]
    pub const fn from_no_color_flag(no_color: bool) -> Self {
        Self {
            color: if no_color {
                ColorMode::Disabled
            } else {
                ColorMode::Enabled
            },
        }
    }

    /// `NO_COLOR` set (to anything) or an explicit flag disables color.
    #[must_use]
    pub fn from_environment(flag: bool) -> Self {
        Self::from_no_color_flag(flag || env::var_os("NO_COLOR").is_some())
    }

    #[must_use]
    pub const fn no_color(self) -> bool {
        matches!(self.color, ColorMode::Disabled)
    }
}

/// Semantic token category independent of concrete color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticToken {
    Accent,
    Success,
    Warning,
    Danger,
    Muted,
}

impl SemanticToken {
    const fn color(self) -> Color {
        match self {
            Self::Accent => Color::Cyan,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Danger => Color::Red,
            Self::Muted => Color::BrightBlack,
        }
    }

    #[must_use]
    pub const fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Ok => Self::Success,
            Severity::Caution => Self::Warning,
            Severity::Danger => Self::Danger,
        }
    }

    #[must_use]
    pub const fn for_tier(tier: ConfidenceTier) -> Self {
        match tier {
            ConfidenceTier::High => Self::Success,
            ConfidenceTier::Medium => Self::Warning,
            ConfidenceTier::Low => Self::Danger,
        }
    }
}

/// Paints text according to an accessibility profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Theme {
    pub accessibility: AccessibilityProfile,
}

impl Theme {
    #[must_use]
    pub const fn new(accessibility: AccessibilityProfile) -> Self {
        Self { accessibility }
    }

    #[must_use]
    pub fn paint(self, text: &str, token: SemanticToken) -> String {
        if self.accessibility.no_color() {
            text.to_string()
        } else {
            text.color(token.color()).to_string()
        }
    }

    #[must_use]
    pub fn strong(self, text: &str, token: SemanticToken) -> String {
        if self.accessibility.no_color() {
            text.to_string()
        } else {
            text.color(token.color()).bold().to_string()
        }
    }
}

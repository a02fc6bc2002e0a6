//! Terminal presentation of the identification flow.

pub mod input;
pub mod render;
pub mod terminal;
pub mod theme;
pub mod widgets;

pub use render::render;
pub use terminal::{ScriptedView, TerminalView};
pub use theme::{AccessibilityProfile, Theme};

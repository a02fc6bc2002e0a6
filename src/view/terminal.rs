//! Line-oriented terminal views: interactive prompt and scripted playback.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use super::input::{ViewCommand, commands_for, parse_line};
use super::render::render;
use super::theme::{SemanticToken, Theme};
use crate::analysis::ConfidenceAnalyzer;
use crate::core::errors::{BevError, Result};
use crate::flow::{FlowEvent, SessionState, ViewAction, ViewPort};
use crate::ports::image::ImagePayload;

const PROMPT: &str = "bevid> ";

fn write_err(err: std::io::Error) -> BevError {
    BevError::Runtime {
        details: format!("terminal write failed: {err}"),
    }
}

/// Map a parsed command to a runtime action.
///
/// `Photo` loads the image here so an unreadable or unsupported file never
/// reaches the session. `Help` has no action.
pub fn to_action(command: ViewCommand) -> Result<Option<ViewAction>> {
    let action = match command {
        ViewCommand::Photo(path) => {
            ViewAction::Event(FlowEvent::SubmitImage(ImagePayload::from_path(&path)?))
        }
        ViewCommand::Continue => ViewAction::Event(FlowEvent::Continue),
        ViewCommand::Accept => ViewAction::Event(FlowEvent::Accept),
        ViewCommand::Flag => ViewAction::Event(FlowEvent::FlagUncertain),
        ViewCommand::Another => ViewAction::Event(FlowEvent::TryAnotherPhoto),
        ViewCommand::Restart => ViewAction::Event(FlowEvent::Restart),
        ViewCommand::StartOver => ViewAction::StartOver,
        ViewCommand::Quit => ViewAction::Quit,
        ViewCommand::Help => return Ok(None),
    };
    Ok(Some(action))
}

// ──────────────────── interactive ────────────────────

/// Prompts on `output`, reads commands from `input`.
pub struct TerminalView<R, W> {
    input: R,
    output: W,
    analyzer: ConfidenceAnalyzer,
    theme: Theme,
}

impl<R: BufRead, W: Write> TerminalView<R, W> {
    pub fn new(input: R, output: W, analyzer: ConfidenceAnalyzer, theme: Theme) -> Self {
        Self {
            input,
            output,
            analyzer,
            theme,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        writeln!(
            self.output,
            "{}",
            self.theme.paint(message, SemanticToken::Warning)
        )
        .map_err(write_err)
    }
}

impl<R: BufRead, W: Write> ViewPort for TerminalView<R, W> {
    fn render(&mut self, state: &SessionState) -> Result<()> {
        let frame = render(state, &self.analyzer, self.theme);
        writeln!(self.output, "{frame}").map_err(write_err)
    }

    fn next_action(&mut self, state: &SessionState) -> Result<Option<ViewAction>> {
        loop {
            write!(self.output, "{PROMPT}").map_err(write_err)?;
            self.output.flush().map_err(write_err)?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| BevError::Runtime {
                    details: format!("terminal read failed: {e}"),
                })?;
            if read == 0 {
                return Ok(None);
            }

            let command = match parse_line(&line, state.step()) {
                Ok(command) => command,
                Err(message) => {
                    self.notice(&message)?;
                    continue;
                }
            };
            if command == ViewCommand::Help {
                let usage: Vec<&str> = commands_for(state.step()).iter().map(|c| c.usage).collect();
                self.notice(&format!("Available: {}, help", usage.join(", ")))?;
                continue;
            }
            match to_action(command) {
                Ok(action) => return Ok(action),
                // A bad photo path is the user's to fix, not a runtime fault.
                Err(err) if err.is_recoverable() || matches!(err, BevError::Io { .. }) => {
                    self.notice(&err.user_message())?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ──────────────────── scripted ────────────────────

/// Replays a fixed list of actions, writing every frame to `output`.
pub struct ScriptedView<W> {
    actions: VecDeque<ViewAction>,
    output: W,
    analyzer: ConfidenceAnalyzer,
    theme: Theme,
    frames: usize,
}

impl<W: Write> ScriptedView<W> {
    pub fn new(
        actions: impl IntoIterator<Item = ViewAction>,
        output: W,
        analyzer: ConfidenceAnalyzer,
        theme: Theme,
    ) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            output,
            analyzer,
            theme,
            frames: 0,
        }
    }

    /// Frames rendered so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> ViewPort for ScriptedView<W> {
    fn render(&mut self, state: &SessionState) -> Result<()> {
        self.frames += 1;
        let frame = render(state, &self.analyzer, self.theme);
        writeln!(self.output, "{frame}").map_err(write_err)
    }

    fn next_action(&mut self, _state: &SessionState) -> Result<Option<ViewAction>> {
        Ok(self.actions.pop_front())
    }
}

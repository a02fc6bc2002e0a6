//! Line input routing: typed commands become flow events.
//!
//! Each step accepts a fixed set of commands; anything else is reported back
//! to the user instead of reaching the state machine.

#![allow(missing_docs)]

use std::path::PathBuf;

use crate::flow::Step;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Photo(PathBuf),
    Continue,
    Accept,
    Flag,
    Another,
    Restart,
    StartOver,
    Help,
    Quit,
}

/// Help-table row for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHelp {
    pub keyword: &'static str,
    pub usage: &'static str,
}

const PHOTO: CommandHelp = CommandHelp {
    keyword: "photo",
    usage: "photo <path>",
};
const CONTINUE: CommandHelp = CommandHelp {
    keyword: "continue",
    usage: "continue",
};
const ACCEPT: CommandHelp = CommandHelp {
    keyword: "accept",
    usage: "accept",
};
const FLAG: CommandHelp = CommandHelp {
    keyword: "flag",
    usage: "flag (not sure)",
};
const ANOTHER: CommandHelp = CommandHelp {
    keyword: "another",
    usage: "another (try another photo)",
};
const RESTART: CommandHelp = CommandHelp {
    keyword: "restart",
    usage: "restart",
};
const START_OVER: CommandHelp = CommandHelp {
    keyword: "start-over",
    usage: "start-over",
};
const QUIT: CommandHelp = CommandHelp {
    keyword: "quit",
    usage: "quit",
};

/// Commands offered in `step`, in display order.
#[must_use]
pub fn commands_for(step: Step) -> &'static [CommandHelp] {
    match step {
        Step::Upload => &[PHOTO, QUIT],
        Step::Classify | Step::Enrich => &[START_OVER, QUIT],
        Step::Review => &[CONTINUE, START_OVER, QUIT],
        Step::Decide => &[ACCEPT, FLAG, ANOTHER, START_OVER, QUIT],
        Step::Result => &[RESTART, START_OVER, QUIT],
    }
}

/// Parse one line typed while the session is in `step`.
///
/// `help` and `quit` are accepted everywhere; `start-over` everywhere past
/// Upload. Errors are user-facing text.
pub fn parse_line(line: &str, step: Step) -> Result<ViewCommand, String> {
    let line = line.trim();
    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(k, r)| (k, r.trim()));
    let keyword = keyword.to_ascii_lowercase();

    match keyword.as_str() {
        "" => return Err("Type a command, or `help` to list them.".to_string()),
        "help" | "?" => return Ok(ViewCommand::Help),
        "quit" | "q" | "exit" => return Ok(ViewCommand::Quit),
        _ => {}
    }

    let offered = commands_for(step);
    let Some(entry) = offered.iter().find(|entry| entry.keyword == keyword) else {
        let names: Vec<&str> = offered.iter().map(|s| s.keyword).collect();
        return Err(format!(
            "`{keyword}` is not available at step {}. Try: {}",
            step.label(),
            names.join(", ")
        ));
    };

    let command = match entry.keyword {
        "photo" => {
            if rest.is_empty() {
                return Err("Usage: photo <path>".to_string());
            }
            ViewCommand::Photo(PathBuf::from(rest))
        }
        "continue" => ViewCommand::Continue,
        "accept" => ViewCommand::Accept,
        "flag" => ViewCommand::Flag,
        "another" => ViewCommand::Another,
        "restart" => ViewCommand::Restart,
        "start-over" => ViewCommand::StartOver,
        _ => ViewCommand::Quit,
    };
    Ok(command)
}

/// Parse a comma-separated event script such as `continue,accept`.
///
/// Scripts are not step-checked here; the session rejects an event that
/// arrives at the wrong step.
pub fn parse_script(script: &str) -> Result<Vec<ViewCommand>, String> {
    script
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(|word| match word.to_ascii_lowercase().as_str() {
            "continue" => Ok(ViewCommand::Continue),
            "accept" => Ok(ViewCommand::Accept),
            "flag" => Ok(ViewCommand::Flag),
            "another" => Ok(ViewCommand::Another),
            "restart" => Ok(ViewCommand::Restart),
            "start-over" => Ok(ViewCommand::StartOver),
            other => Err(format!(
                "unknown scripted event `{other}` (expected continue, accept, flag, another, restart, start-over)"
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_words_map_to_commands() {
        assert_eq!(
            parse_script("continue, accept,,restart"),
            Ok(vec![
                ViewCommand::Continue,
                ViewCommand::Accept,
                ViewCommand::Restart
            ])
        );
        assert!(parse_script("continue,photo").is_err());
        assert_eq!(parse_script(""), Ok(Vec::new()));
    }

    #[test]
    fn photo_takes_the_rest_of_the_line_as_path() {
        assert_eq!(
            parse_line("photo  /tmp/my drink.jpg ", Step::Upload),
            Ok(ViewCommand::Photo(PathBuf::from("/tmp/my drink.jpg")))
        );
        assert!(parse_line("photo", Step::Upload).is_err());
    }

    #[test]
    fn commands_are_scoped_to_their_step() {
        assert_eq!(parse_line("ACCEPT", Step::Decide), Ok(ViewCommand::Accept));
        let err = parse_line("accept", Step::Review).unwrap_err();
        assert!(err.contains("not available at step Review"));
        assert!(err.contains("continue"));
        assert!(parse_line("start-over", Step::Upload).is_err());
    }

    #[test]
    fn help_and_quit_work_everywhere() {
        for step in Step::ALL {
            assert_eq!(parse_line("help", step), Ok(ViewCommand::Help));
            assert_eq!(parse_line("q", step), Ok(ViewCommand::Quit));
        }
    }

    #[test]
    fn every_offered_command_parses() {
        for step in Step::ALL {
            for entry in commands_for(step) {
                let line = if entry.keyword == "photo" {
                    "photo a.png"
                } else {
                    entry.keyword
                };
                assert!(parse_line(line, step).is_ok(), "{line} at {step:?}");
            }
        }
    }

    #[test]
    fn blank_line_is_rejected() {
        assert!(parse_line("   ", Step::Result).is_err());
    }
}

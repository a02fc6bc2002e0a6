//! Top-level CLI definition and dispatch.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;

use crate::analysis::{AnalysisReport, ConfidenceAnalyzer, RankedResult, Severity, rank_scores};
use crate::core::config::Config;
use crate::core::errors::{BevError, Result};
use crate::core::taxonomy::LabelClass;
use crate::flow::{FlowEvent, FlowServices, Session, ViewAction, run_view};
use crate::ports::enrichment::percent;
use crate::ports::image::ImagePayload;
use crate::view::input::{ViewCommand, parse_script};
use crate::view::terminal::to_action;
use crate::view::{AccessibilityProfile, ScriptedView, TerminalView, Theme};

/// Beverage identifier: classify a drink photo and warn when an alcohol verdict may be wrong.
#[derive(Debug, Parser)]
#[command(name = "bevid", version, about)]
pub struct Cli {
    /// Configuration file (defaults to $BEVID_CONFIG, then built-in defaults).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output (NO_COLOR is honoured as well).
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the confidence analyzer on a JSON file of `[{label, score}]`.
    Analyze(AnalyzeArgs),
    /// Identify a beverage photo by walking the six-step flow.
    Identify(IdentifyArgs),
    /// Show or validate the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the candidate vocabulary split into alcohol / non-alcohol.
    Labels,
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Scores file; order does not matter, candidates are ranked first.
    pub scores: PathBuf,
    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdentifyArgs {
    /// Photo to identify (JPEG, PNG or WEBP).
    pub image: PathBuf,
    /// Comma-separated events to replay after upload, e.g. `continue,accept`.
    #[arg(long, conflicts_with = "interactive", value_parser = parse_event_script)]
    pub events: Option<EventScript>,
    /// Prompt for each step on the terminal.
    #[arg(long)]
    pub interactive: bool,
    /// Print the final session as JSON instead of rendered frames.
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Validate the configuration and report the result.
    Check,
}

/// Parsed `--events` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventScript(pub Vec<ViewCommand>);

fn parse_event_script(raw: &str) -> std::result::Result<EventScript, String> {
    parse_script(raw).map(EventScript)
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<()> {
    let theme = Theme::new(AccessibilityProfile::from_environment(cli.no_color));
    if theme.accessibility.no_color() {
        colored::control::set_override(false);
    }

    match &cli.command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "bevid", &mut io::stdout());
            Ok(())
        }
        Command::Config { action } => {
            let config = Config::load(cli.config.as_deref())?;
            match action {
                ConfigAction::Show => print!("{}", config.to_toml_string()?),
                ConfigAction::Check => println!(
                    "{} {} candidates, thresholds high={} medium={}, top_n={}",
                    "configuration OK:".green(),
                    config.labels.candidates.len(),
                    config.thresholds.high,
                    config.thresholds.medium,
                    config.thresholds.top_n
                ),
            }
            Ok(())
        }
        Command::Labels => {
            let config = Config::load(cli.config.as_deref())?;
            let analyzer = ConfidenceAnalyzer::from_config(&config)?;
            for (class, title) in [
                (LabelClass::Alcohol, "alcohol"),
                (LabelClass::NonAlcohol, "non-alcohol"),
            ] {
                println!("{}", title.bold());
                for label in analyzer.taxonomy().labels_in(class) {
                    println!("  {label}");
                }
            }
            Ok(())
        }
        Command::Analyze(args) => {
            let config = Config::load(cli.config.as_deref())?;
            run_analyze(&config, args)
        }
        Command::Identify(args) => {
            let config = Config::load(cli.config.as_deref())?;
            run_identify(&config, args, theme)
        }
    }
}

fn read_scores(path: &Path) -> Result<Vec<RankedResult>> {
    let raw = std::fs::read_to_string(path).map_err(|e| BevError::io(path, e))?;
    let parsed: Vec<RankedResult> = serde_json::from_str(&raw)?;
    Ok(rank_scores(parsed.into_iter().map(|r| (r.label, r.score))))
}

fn run_analyze(config: &Config, args: &AnalyzeArgs) -> Result<()> {
    let analyzer = ConfidenceAnalyzer::from_config(config)?;
    let results = read_scores(&args.scores)?;
    let report = analyzer.analyze(&results)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!(
        "{} {} ({})",
        "top:".bold(),
        report.top_label,
        percent(report.top_score)
    );
    println!(
        "{} {} | alcohol={} | false_negative_risk={} | block_enrichment={}",
        "tier:".bold(),
        report.confidence_tier.as_str(),
        report.is_alcohol,
        report.false_negative_risk,
        report.block_enrichment
    );
    let message = match report.severity {
        Severity::Ok => report.plain_message.green(),
        Severity::Caution => report.plain_message.yellow(),
        Severity::Danger => report.plain_message.red(),
    };
    println!("{message}");
    for candidate in &report.top_n {
        println!("  {:>4}  {}", percent(candidate.score), candidate.label);
    }
}

fn run_identify(config: &Config, args: &IdentifyArgs, theme: Theme) -> Result<()> {
    let image = ImagePayload::from_path(&args.image)?;
    let services = Arc::new(FlowServices::from_config(config)?);
    let analyzer = services.analyzer().clone();
    let mut session = Session::new(services);
    tracing::info!(session = session.id(), image = %args.image.display(), "identify");

    if args.interactive {
        session.dispatch(FlowEvent::SubmitImage(image))?;
        let stdin = io::stdin();
        let mut view = TerminalView::new(stdin.lock(), io::stdout(), analyzer, theme);
        return run_view(&mut session, &mut view);
    }

    let mut actions = vec![ViewAction::Event(FlowEvent::SubmitImage(image))];
    for command in args.events.iter().flat_map(|script| script.0.iter().cloned()) {
        actions.extend(to_action(command)?);
    }

    if args.json {
        let mut view = ScriptedView::new(actions, io::sink(), analyzer, theme);
        run_view(&mut session, &mut view)?;
        let snapshot = session.state().snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        let mut view = ScriptedView::new(actions, io::stdout(), analyzer, theme);
        run_view(&mut session, &mut view)?;
        io::stdout().flush().map_err(|e| BevError::Runtime {
            details: format!("stdout flush failed: {e}"),
        })?;
    }
    Ok(())
}

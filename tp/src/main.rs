//! tp - trip planning engine CLI
//!
//! Replays event scripts through a session and inspects resolver decisions.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use tripplanner::cli::{Cli, Command, OutputFormat, read_document};
use tripplanner::config::Config;
use tripplanner::domain::TripFacts;
use tripplanner::orchestrator::{Dispatch, DispatchStatus, Event};
use tripplanner::resolver::{self, ResolverOptions};
use tripplanner::session::{SessionSnapshot, TripSession};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("tripplanner.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    debug!(?config, "main: config loaded");

    match cli.command {
        Command::Replay { file, format } => {
            debug!(file = %file.display(), ?format, "main: matched Replay command");
            let events: Vec<Event> = read_document(&file)?;
            cmd_replay(config.resolver, events, format)
        }
        Command::Resolve { file, format } => {
            debug!(file = %file.display(), ?format, "main: matched Resolve command");
            let facts: TripFacts = read_document(&file)?;
            cmd_resolve(&config.resolver, &facts, format)
        }
    }
}

fn cmd_replay(options: ResolverOptions, events: Vec<Event>, format: OutputFormat) -> Result<()> {
    info!(count = events.len(), "cmd_replay: replaying events");
    let mut session = TripSession::new(options);
    let mut steps = Vec::with_capacity(events.len());

    for (index, event) in events.into_iter().enumerate() {
        let name = event.name();
        let dispatch = session.submit(event);
        if format == OutputFormat::Text {
            print_dispatch(index + 1, name, &dispatch, &session);
        }
        steps.push(ReplayStep { event: name, dispatch });
    }

    let snapshot = session.snapshot();
    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({ "steps": steps, "final": snapshot });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_snapshot(&snapshot),
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct ReplayStep {
    event: &'static str,
    #[serde(flatten)]
    dispatch: Dispatch,
}

fn cmd_resolve(options: &ResolverOptions, facts: &TripFacts, format: OutputFormat) -> Result<()> {
    let next = resolver::resolve(facts, options);
    let missing = resolver::missing_fields(facts, options);
    let progress = resolver::progress_percent(facts, options);

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "nextWidget": next,
                "missingFields": missing,
                "progressPercent": progress,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            match &next {
                Some(request) => println!(
                    "{} {} ({})",
                    "next:".bold(),
                    request.widget_type.to_string().cyan(),
                    request.reason
                ),
                None => println!("{} {}", "next:".bold(), "ready to search".green()),
            }
            let missing: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
            println!("{} {}", "missing:".bold(), missing.join(", "));
            println!("{} {}%", "progress:".bold(), progress);
        }
    }
    Ok(())
}

fn print_dispatch(step: usize, event: &str, dispatch: &Dispatch, session: &TripSession) {
    match &dispatch.status {
        DispatchStatus::Applied => {
            let trail: Vec<String> = dispatch.transitions.iter().map(|s| s.to_string()).collect();
            let widget = session
                .active_widget()
                .map(|w| format!(" [{}]", w.widget_type))
                .unwrap_or_default();
            println!(
                "{:>3} {} {} {}{}",
                step.to_string().dimmed(),
                "✓".green(),
                event.yellow(),
                trail.join(" → "),
                widget.cyan()
            );
        }
        DispatchStatus::Ignored(rejection) => {
            println!(
                "{:>3} {} {} ignored: {}",
                step.to_string().dimmed(),
                "✗".red(),
                event.yellow(),
                rejection
            );
        }
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!();
    println!("{} {}", "state:".bold(), snapshot.current_state.to_string().cyan());
    if let Some(widget) = &snapshot.active_widget {
        println!("{} {} ({})", "widget:".bold(), widget.widget_type, widget.reason);
    }
    println!("{} {}", "ready:".bold(), snapshot.is_ready_to_search);
    println!("{} {}%", "progress:".bold(), snapshot.progress_percent);
    println!("{} {}", "step:".bold(), snapshot.planning_step);
    if !snapshot.missing_fields.is_empty() {
        let missing: Vec<String> = snapshot.missing_fields.iter().map(|f| f.to_string()).collect();
        println!("{} {}", "missing:".bold(), missing.join(", "));
    }
    if let Some(error) = &snapshot.last_error {
        println!("{} {}", "last error:".bold(), error.red());
    }
    println!("{} {} entries", "history:".bold(), snapshot.history.len());
}

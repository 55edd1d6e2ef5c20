//! Specgate - quality gates for phased document workflows.
//!
//! Scores specification, plan, task and implementation documents and decides
//! whether a project may move on to the next phase.

#![allow(clippy::single_match_else)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use specgate::core::{settle, Config, Phase};
use specgate::workflow::{
    AdvanceDecision, FsStore, GateEvaluator, IterationStore, PhaseParams, WorkflowStatus,
};
use specgate::QualityEngine;

/// Quality gates for phased document workflows
#[derive(Parser)]
#[command(name = "specgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Workspace root holding one directory per project
    #[arg(long, global = true, env = "SPECGATE_ROOT")]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Output format for structured results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a project may leave a phase
    Check {
        /// Project id
        project: String,

        /// Phase to check (spec, plan, tasks, implement)
        phase: String,

        /// JSON file describing the document when none exists yet
        #[arg(long)]
        params: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record the current document as a new revision
    Record {
        /// Project id
        project: String,

        /// Phase of the document
        phase: Phase,

        /// Read the revision from this file instead of the project's document
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Score a document without touching any project
    Analyze {
        /// Document to score, or `-` for stdin
        file: PathBuf,

        /// Phase to score the document for
        #[arg(short, long, default_value = "spec")]
        phase: Phase,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recorded revisions of a phase
    History {
        /// Project id
        project: String,

        /// Phase to show
        phase: Phase,

        /// Include the full comparison of each revision
        #[arg(short, long)]
        detailed: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the gate table
    Gates {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Move a project past a phase if its gate passes
    Advance {
        /// Project id
        project: String,

        /// Phase to leave
        phase: Phase,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Write the effective configuration to the global config file
        #[arg(long, conflicts_with = "path")]
        save: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let root = cli.root;

    // Handle commands
    let passed = match cli.command {
        Commands::Check { project, phase, params, format } => {
            cmd_check(root, &project, &phase, params.as_deref(), format)?
        }
        Commands::Record { project, phase, file } => {
            cmd_record(root, &project, phase, file.as_deref())?;
            true
        }
        Commands::Analyze { file, phase, format } => {
            cmd_analyze(&file, phase, format)?;
            true
        }
        Commands::History { project, phase, detailed, format } => {
            cmd_history(root, &project, phase, detailed, format)?;
            true
        }
        Commands::Gates { format } => {
            cmd_gates(format)?;
            true
        }
        Commands::Advance { project, phase, format } => cmd_advance(root, &project, phase, format)?,
        Commands::Config { path, save } => {
            cmd_config(path, save)?;
            true
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration and resolve the workspace root.
fn load(root: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config = Config::load().context("Failed to load configuration")?;
    let root = root.unwrap_or_else(|| config.root());
    Ok((config, root))
}

fn evaluator(config: &Config, root: &Path) -> GateEvaluator {
    GateEvaluator::new(Arc::new(FsStore::new(root)), config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Check a phase gate. Returns whether the gate passed.
fn cmd_check(
    root: Option<PathBuf>,
    project: &str,
    phase: &str,
    params: Option<&Path>,
    format: OutputFormat,
) -> Result<bool> {
    let (config, root) = load(root)?;
    let params: Option<PhaseParams> = match params {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(serde_json::from_str(&content).context("Invalid phase parameters")?)
        }
        None => None,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let status = rt.block_on(async {
        evaluator(&config, &root).check_phase_readiness(project, phase, params.as_ref()).await
    })?;

    print_status(&status, format)?;
    Ok(status.can_proceed)
}

fn print_status(status: &WorkflowStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(status)?,
        OutputFormat::Text => print!("{}", status.to_markdown()),
    }
    Ok(())
}

/// Record a revision.
fn cmd_record(root: Option<PathBuf>, project: &str, phase: Phase, file: Option<&Path>) -> Result<()> {
    let (config, root) = load(root)?;
    let content = file
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(async {
        let gate = evaluator(&config, &root);
        match &content {
            Some(text) => gate.record_iteration(project, phase, text).await,
            None => gate.record_current(project, phase).await,
        }
    })?;

    println!("{summary}");
    Ok(())
}

/// Score a standalone document.
fn cmd_analyze(file: &Path, phase: Phase, format: OutputFormat) -> Result<()> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?
    };

    let config = Config::load().context("Failed to load configuration")?;
    let (assessment, degraded) = settle(QualityEngine::new(&config.analysis).assess(&text, phase));

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "assessment": assessment,
            "degraded": degraded,
        }))?,
        OutputFormat::Text => {
            if let Some(reason) = &degraded {
                eprintln!("warning: approximate score ({reason})");
            }
            print!("{}", assessment.to_markdown());
        }
    }

    Ok(())
}

/// Show recorded revisions.
fn cmd_history(
    root: Option<PathBuf>,
    project: &str,
    phase: Phase,
    detailed: bool,
    format: OutputFormat,
) -> Result<()> {
    let (_, root) = load(root)?;
    let store = FsStore::new(root);

    let rt = tokio::runtime::Runtime::new()?;
    let history = rt.block_on(store.read_history(project, phase))?;

    if format == OutputFormat::Json {
        return print_json(&history);
    }

    if history.is_empty() {
        println!("No iterations recorded for {project} / {phase}");
        return Ok(());
    }

    for (i, record) in history.iter().enumerate() {
        println!(
            "{:>3}  {}  score {:>3}  {}",
            i + 1,
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.quality_score,
            record.summary
        );
        if let Some(reason) = &record.degraded {
            println!("     approximate score: {reason}");
        }
        if detailed {
            if let Some(analysis) = &record.analysis {
                println!("\n{}", analysis.detailed_analysis);
            }
        }
    }

    let meaningful = history.iter().filter(|r| r.is_meaningful()).count();
    println!("\nTotal: {} iterations ({meaningful} meaningful)", history.len());

    Ok(())
}

/// Show the gate table.
fn cmd_gates(format: OutputFormat) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let gates = specgate::workflow::GateTable::from_config(&config.gates);

    if format == OutputFormat::Json {
        return print_json(&gates.iter().collect::<Vec<_>>());
    }

    for gate in gates.iter() {
        println!(
            "{:<10} quality >= {:>3}  iterations >= {}  content: {}",
            gate.phase,
            gate.required_quality,
            gate.required_iterations,
            gate.required_content.join(", ")
        );
    }

    Ok(())
}

/// Try to leave a phase. Returns whether the gate passed.
fn cmd_advance(root: Option<PathBuf>, project: &str, phase: Phase, format: OutputFormat) -> Result<bool> {
    let (config, root) = load(root)?;

    let rt = tokio::runtime::Runtime::new()?;
    let decision = rt.block_on(evaluator(&config, &root).advance(project, phase))?;

    if format == OutputFormat::Json {
        print_json(&decision)?;
    } else {
        match &decision {
            AdvanceDecision::Advance { from, to, .. } => println!("{project}: {from} -> {to}"),
            AdvanceDecision::Complete { .. } => println!("{project}: workflow complete"),
            AdvanceDecision::Blocked { status } => {
                println!("{project}: blocked at {phase}");
                for reason in &status.blocking_reasons {
                    println!("  - {reason}");
                }
            }
        }
    }

    Ok(decision.status().can_proceed)
}

/// Show configuration.
fn cmd_config(show_path: bool, save: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    if save {
        config.save()?;
        if let Some(path) = Config::config_dir() {
            println!("Saved {}", path.join("config.toml").display());
        }
        return Ok(());
    }

    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "specgate", &mut io::stdout());
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tokenloom - design tokens from a node graph
//!
//! A headless driver for the token graph engine:
//! - Replays scripted editing sessions (RON scenarios)
//! - Prints the resulting design tokens and a preview stylesheet
//! - Writes export nodes to `<name>.json`
//!
//! ## Architecture
//!
//! All graph semantics live in `tokenloom_graph`. This binary only
//! supplies the collaborators around it: configuration, the input event
//! source, the styling preview and the file exporter.

mod config;
mod export;
mod preview;
mod scenario;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::{AppConfig, CONFIG_FILE_NAME, DEFAULT_LOG_FILTER};
use preview::{PreviewWidget, StyleSheet};
use scenario::{Scenario, ScenarioRunner};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokenloom_graph::{EvaluationStrategy, NodeKind, Session, SocketDef};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "tokenloom",
    version,
    about = "Compose design tokens from a node graph",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario and print the resulting tokens
    Run {
        /// Scenario file (RON)
        scenario: PathBuf,
        /// Config file, defaults to `tokenloom.ron` in the working directory
        #[arg(long)]
        config: Option<PathBuf>,
        /// Evaluation strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Directory export files are written to
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Widget the preview stylesheet targets
        #[arg(long, value_enum)]
        widget: Option<PreviewWidget>,
        /// Skip writing export files
        #[arg(long)]
        no_export: bool,
    },
    /// List node kinds with their sockets and controls
    Kinds,
    /// Write a config file holding the defaults
    Init {
        /// Destination, defaults to `tokenloom.ron` in the working directory
        #[arg(long)]
        config: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StrategyArg {
    Full,
    Incremental,
}

impl From<StrategyArg> for EvaluationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Full => EvaluationStrategy::Full,
            StrategyArg::Incremental => EvaluationStrategy::Incremental,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            scenario,
            config,
            strategy,
            export_dir,
            widget,
            no_export,
        } => {
            let config_path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            let mut config = AppConfig::load_or_default(&config_path)
                .with_context(|| format!("loading {}", config_path.display()))?;
            if let Some(strategy) = strategy {
                config.strategy = strategy.into();
            }
            if let Some(export_dir) = export_dir {
                config.export_dir = export_dir;
            }
            if let Some(widget) = widget {
                config.widget = widget;
            }

            init_tracing(&config.log_filter)?;
            tracing::info!("Starting Tokenloom v{}", env!("CARGO_PKG_VERSION"));
            run(&config, &scenario, !no_export)
        }
        Command::Kinds => {
            init_tracing(DEFAULT_LOG_FILTER)?;
            for kind in NodeKind::ALL {
                print!("{}", describe_kind(kind));
            }
            Ok(())
        }
        Command::Init { config, force } => {
            init_tracing(DEFAULT_LOG_FILTER)?;
            let path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !force {
                anyhow::bail!("{} already exists, pass --force to replace it", path.display());
            }
            AppConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn init_tracing(directives: &str) -> anyhow::Result<()> {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        env_filter = env_filter.add_directive(
            directive
                .parse::<Directive>()
                .with_context(|| format!("invalid log directive '{directive}'"))?,
        );
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn run(config: &AppConfig, scenario_path: &Path, export: bool) -> anyhow::Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let mut session = Session::new(config.strategy, config.limits());
    ScenarioRunner::new(&mut session)
        .run(&scenario)
        .with_context(|| format!("running scenario '{}'", scenario.name))?;

    let tokens = session.tokens();
    println!("Tokens:");
    if tokens.is_empty() {
        println!("  (none)");
    }
    for binding in &tokens {
        println!("  {}: {}", binding.token, binding.value);
    }

    let mut sheet = StyleSheet::new(config.widget);
    sheet.extend(&tokens);
    if !sheet.is_empty() {
        println!("\nPreview ({}):\n{sheet}", sheet.widget());
    }

    let payloads = session.exports()?;
    if export {
        let written = export::write_exports(&config.export_dir, &payloads)?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    } else if !payloads.is_empty() {
        tracing::info!("Skipped {} export(s)", payloads.len());
    }

    Ok(())
}

fn describe_kind(kind: NodeKind) -> String {
    let spec = kind.spec();
    let sockets = |defs: &[SocketDef]| {
        if defs.is_empty() {
            "-".to_string()
        } else {
            defs.iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
        }
    };

    let mut out = format!(
        "{} ({:?})\n  {}\n  inputs: {}\n  outputs: {}\n",
        spec.name,
        spec.category,
        spec.description,
        sockets(spec.inputs),
        sockets(spec.outputs),
    );
    for control in spec.controls {
        let _ = writeln!(out, "  control {} = {:?}", control.name, control.default_value());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "tokenloom",
            "run",
            "brand.ron",
            "--strategy",
            "full",
            "--widget",
            "card",
            "--no-export",
        ])
        .unwrap();

        let Command::Run {
            scenario,
            strategy,
            widget,
            no_export,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(scenario, PathBuf::from("brand.ron"));
        assert_eq!(strategy.map(EvaluationStrategy::from), Some(EvaluationStrategy::Full));
        assert_eq!(widget, Some(PreviewWidget::Card));
        assert!(no_export);
    }

    #[test]
    fn test_describe_kind() {
        let text = describe_kind(NodeKind::MixColors);
        assert!(text.starts_with("Mix Colors (Operation)"));
        assert!(text.contains("inputs: A, B"));
        assert!(text.contains("outputs: result"));

        let text = describe_kind(NodeKind::ExportSink);
        assert!(text.contains("outputs: -"));
        assert!(text.contains("control name"));
    }
}

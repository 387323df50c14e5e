//! deckfill - fill PPTX slide placeholders from a JSON configuration

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use template::{fill_presentation, FillConfig, FillOutcome};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "deckfill", version, about = "Fill PPTX slide placeholders from JSON")]
struct Cli {
    #[arg(short, long, value_name = "CONFIG", help = "Fill configuration (JSON)")]
    input: PathBuf,

    #[arg(long, value_name = "PATH", help = "Write the deck here instead of outputPptx")]
    output: Option<PathBuf>,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Raise log level (-v debug, -vv trace)"
    )]
    verbose: u8,
}

/// `RUST_LOG` applies unless `-v` is given
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = FillConfig::from_file(&cli.input)
        .with_context(|| format!("failed to load configuration {}", cli.input.display()))?;
    if let Some(output) = &cli.output {
        config.output_pptx = output.clone();
    }

    let filled = fill_presentation(&config)
        .with_context(|| format!("failed to fill {}", config.template_pptx.display()))?;

    let overflowed: Vec<&str> = filled
        .iter()
        .filter(|p| matches!(&p.outcome, FillOutcome::Fitted { fit, .. } if fit.overflow))
        .map(|p| p.key.as_str())
        .collect();
    if !overflowed.is_empty() {
        warn!(
            "text still overflows at the minimum size: {}",
            overflowed.join(", ")
        );
    }
    info!(
        "filled {} placeholder(s) into {}",
        filled.len(),
        config.output_pptx.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

//! Benchmaker CLI
//!
//! Command-line interface for running test suites against language models
//! and comparing the results.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use benchmaker_cli::commands::{compare, config, models, run, runs, CommandContext};
use benchmaker_cli::output::OutputFormat;
use benchmaker_common::{init_from_config, AppConfig};

/// Output format for CLI commands
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum CliOutputFormat {
    /// Table output (default)
    #[default]
    Table,
    /// JSON output
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Table => OutputFormat::Table,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "benchmaker")]
#[command(author, version, about = "Benchmark language models against shared test suites")]
#[command(long_about = "Runs test suites against models behind an OpenAI-compatible gateway, \
    scores every response and compares models across repeated runs.")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "table")]
    format: CliOutputFormat,

    /// Configuration file layered over config/ and the environment
    #[arg(short, long, global = true, env = "BENCHMAKER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List models offered by the gateway
    #[command(alias = "m")]
    Models {
        /// Only show models whose id or name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Execute a suite against one or more models
    #[command(alias = "r")]
    Run {
        /// Suite id in the snapshot (defaults to the active suite)
        #[arg(short, long, conflicts_with = "suite_file")]
        suite: Option<String>,

        /// JSON file with a suite definition
        #[arg(long)]
        suite_file: Option<PathBuf>,

        /// Model id, repeatable
        #[arg(short, long = "model", required = true)]
        models: Vec<String>,

        /// Judge model for llm-judge test cases
        #[arg(short, long)]
        judge_model: Option<String>,

        /// Force deterministic sampling
        #[arg(short, long)]
        benchmark_mode: bool,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Completion token limit
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Maximum concurrent requests
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// List stored runs
    Runs {
        /// Only runs of this suite
        #[arg(short, long)]
        suite: Option<String>,
    },

    /// Compare models across completed runs of a suite
    #[command(alias = "cmp")]
    Compare {
        /// Suite id (defaults to the active suite)
        #[arg(short, long)]
        suite: Option<String>,

        /// Restrict to these run ids, repeatable
        #[arg(short, long = "run")]
        runs: Vec<String>,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut app_config = AppConfig::load_from(cli.config.as_deref())?;
    if cli.verbose {
        app_config.telemetry.log_level = "debug".to_string();
    }
    init_from_config(&app_config.telemetry)?;

    let ctx = CommandContext::new(app_config, cli.format.into());

    let result = match cli.command {
        Commands::Models { filter } => models::list(&ctx, filter).await,

        Commands::Run {
            suite,
            suite_file,
            models,
            judge_model,
            benchmark_mode,
            temperature,
            max_tokens,
            concurrency,
        } => {
            let options = run::RunOptions {
                suite,
                suite_file,
                models,
                judge_model,
                benchmark_mode,
                temperature,
                max_tokens,
                concurrency,
            };
            run::execute(&ctx, options).await
        }

        Commands::Runs { suite } => runs::list(&ctx, suite).await,

        Commands::Compare { suite, runs } => compare::compare(&ctx, suite, runs).await,

        Commands::Config => config::show(&ctx),
    };

    if let Err(e) = result {
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), e);
        if cli.verbose {
            eprintln!("\n{}", "Backtrace:".dimmed());
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

//! Honesty harness command-line runner
//!
//! Loads an evaluation suite, runs it against the canned mock provider and
//! writes the results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use honesty_harness_evals::{EvalOptions, EvalRunner, EvalSuite, MockProvider};

#[derive(Parser)]
#[command(name = "honesty-harness")]
#[command(about = "Multi-trial behavioral evaluation for text-generation models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "HONESTY_HARNESS_LOG_FORMAT"
    )]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a suite and report pass rates and flakiness
    Run {
        /// Suite file (YAML or JSON)
        suite: PathBuf,

        /// Trials per case
        #[arg(short, long, default_value_t = 5, env = "HONESTY_HARNESS_TRIALS")]
        trials: u32,

        /// A pass rate must be above this to count as flaky
        #[arg(long, default_value_t = 0.2, env = "HONESTY_HARNESS_FLAKY_LOW")]
        flaky_low: f64,

        /// A pass rate must be below this to count as flaky
        #[arg(long, default_value_t = 0.8, env = "HONESTY_HARNESS_FLAKY_HIGH")]
        flaky_high: f64,

        /// Maximum cases in flight
        #[arg(short, long, default_value_t = 1, env = "HONESTY_HARNESS_CONCURRENCY")]
        concurrency: usize,

        /// Directory for run and summary files
        #[arg(short, long, default_value = "results", env = "HONESTY_HARNESS_OUT_DIR")]
        out_dir: PathBuf,

        /// YAML mapping of prompt needle to canned mock response
        #[arg(long, env = "HONESTY_HARNESS_CANNED")]
        canned: Option<PathBuf>,

        /// Print results without writing files
        #[arg(long)]
        no_save: bool,

        /// Also print the human-readable report
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load and validate a suite without running it
    Validate {
        /// Suite file (YAML or JSON)
        suite: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Run {
            suite,
            trials,
            flaky_low,
            flaky_high,
            concurrency,
            out_dir,
            canned,
            no_save,
            verbose,
        } => {
            let options = EvalOptions::new()
                .trials(trials)
                .flaky_thresholds(flaky_low, flaky_high)
                .concurrency(concurrency);
            let out_dir = if no_save { None } else { Some(out_dir.as_path()) };
            run_suite(&suite, options, canned.as_deref(), out_dir, verbose).await
        }
        Commands::Validate { suite } => validate_suite(&suite),
    }
}

/// Filter from `RUST_LOG`, falling back to `info` when unset or invalid.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_tracing(format: LogFormat) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_suite(path: &Path) -> Result<EvalSuite> {
    EvalSuite::from_yaml(path).with_context(|| format!("Failed to load suite {}", path.display()))
}

fn load_provider(canned: Option<&Path>) -> Result<MockProvider> {
    let Some(path) = canned else {
        return Ok(MockProvider::new());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read canned responses {}", path.display()))?;
    let provider = MockProvider::from_yaml_str(&content)
        .with_context(|| format!("Invalid canned responses {}", path.display()))?;
    info!(responses = provider.canned.len(), "Loaded canned responses");
    Ok(provider)
}

async fn run_suite(
    suite_path: &Path,
    options: EvalOptions,
    canned: Option<&Path>,
    out_dir: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let suite = load_suite(suite_path)?;
    let provider = load_provider(canned)?;

    let report = EvalRunner::new()
        .options(options)
        .run(&suite, &provider)
        .await
        .context("Suite run failed")?;

    if verbose {
        eprintln!("{}", report.to_text());
    }

    println!("{}", report.summary_json()?);

    if let Some(out_dir) = out_dir {
        let run_path = report
            .save(out_dir)
            .with_context(|| format!("Failed to save results to {}", out_dir.display()))?;
        println!("\nSaved: {}", run_path.display());
    }

    Ok(())
}

fn validate_suite(path: &Path) -> Result<()> {
    let suite = load_suite(path)?;

    let name = suite.name.as_deref().unwrap_or("(unnamed)");
    println!("Suite {}: {} cases", name, suite.len());
    for case in &suite.cases {
        println!("  {}", case);
        if case.is_ambiguous() {
            println!("    warning: prompt/expected are ignored on a metamorphic case");
        }
    }

    Ok(())
}

//! auspex: resolve a binary prediction-market question from the command line.
//!
//! ```text
//! auspex "Who wins the final?" "Brazil" "France" --providers openai,gemini --detailed
//! ```
//!
//! Credentials come from `<PROVIDER_NAME>_API_KEY` environment variables.
//! Request-level failures print the same error object a gateway would
//! return and exit non-zero.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use auspex_core::EvaluationQuestion;
use auspex_runtime::{
    ConsensusEngineBuilder, DetailedResponse, EngineError, EnvCredentials, ErrorBody,
    EvaluateResponse, EvaluationReport, RuntimeConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Wire-format JSON
    Json,
    /// Human-readable summary
    Text,
}

/// Multi-provider consensus oracle for binary prediction-market questions.
#[derive(Parser)]
#[command(name = "auspex", version, about)]
struct Cli {
    /// The question to resolve
    question: String,

    /// First candidate outcome
    option_a: String,

    /// Second candidate outcome
    option_b: String,

    /// Restrict to a subset of configured providers
    #[arg(long, value_delimiter = ',')]
    providers: Option<Vec<String>>,

    /// YAML config file (roster, floor, policy, timeout)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum confidence a verdict needs to vote
    #[arg(long)]
    floor: Option<f64>,

    /// Vote threshold rule: majority or atleast:N
    #[arg(long)]
    policy: Option<String>,

    /// Per-provider call timeout, e.g. "10s"
    #[arg(long)]
    timeout: Option<String>,

    /// Include every provider attempt in the output
    #[arg(long)]
    detailed: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let question = match EvaluationQuestion::new(&cli.question, &cli.option_a, &cli.option_b) {
        Ok(q) => q,
        Err(e) => fail(&EngineError::InvalidInput(e.to_string()), cli.format),
    };

    let engine = ConsensusEngineBuilder::new()
        .credentials(Arc::new(EnvCredentials))
        .config(config)
        .build()?;

    match engine
        .evaluate_selected(&question, cli.providers.as_deref())
        .await
    {
        Ok(report) => {
            tracing::info!(
                providers = report.result.providers.len(),
                confidence = report.result.confidence,
                "evaluation complete"
            );
            print_report(&report, cli.detailed, cli.format)?;
            Ok(())
        }
        Err(e) => fail(&e, cli.format),
    }
}

/// Merge the config file (or defaults) with CLI overrides.
fn build_config(cli: &Cli) -> anyhow::Result<RuntimeConfig> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    if let Some(floor) = cli.floor {
        config.confidence_floor = floor;
    }
    if let Some(policy) = &cli.policy {
        config.policy = policy.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(timeout) = &cli.timeout {
        config.call_timeout =
            humantime::parse_duration(timeout).context("parsing --timeout")?;
    }

    config.validate()?;
    Ok(config)
}

fn print_report(
    report: &EvaluationReport,
    detailed: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json if detailed => {
            println!("{}", serde_json::to_string_pretty(&DetailedResponse::from(report))?);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&EvaluateResponse::from(&report.result))?
            );
        }
        OutputFormat::Text => {
            let result = &report.result;
            let verdict = match (result.option_a_true, result.option_b_true) {
                (true, false) => "option A",
                (false, true) => "option B",
                (true, true) => "both options reached the threshold",
                (false, false) => "no consensus",
            };
            println!("Verdict:    {}", verdict);
            println!("Confidence: {:.2}", result.confidence);
            println!(
                "Votes:      A={} B={} abstained={}",
                result.votes.option_a, result.votes.option_b, result.votes.abstained
            );
            println!("Providers:  {}", result.providers.join(", "));
            if detailed {
                println!("Attempts:");
                for attempt in &report.attempts {
                    println!("  - {}: {:?}", attempt.provider, attempt.outcome);
                }
            }
            println!("\n{}", result.reasoning);
        }
    }
    Ok(())
}

/// Print a request-level failure the way a gateway would, then exit 1.
fn fail(error: &EngineError, format: OutputFormat) -> ! {
    let body = ErrorBody::from(error);
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&body) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("{}: {}", body.kind, body.detail),
        },
        OutputFormat::Text => eprintln!("{}: {}", body.kind, body.detail),
    }
    std::process::exit(1);
}

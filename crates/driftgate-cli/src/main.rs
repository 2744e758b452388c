//! driftgate - deployment risk gate for infrastructure what-if output
//!
//! Reads what-if text on stdin, classifies it through an LLM backend,
//! filters reporting noise, and gates the result against per-bucket risk
//! thresholds. Exit code carries the verdict: 0 safe, 1 unsafe or
//! evaluation failure, 2 bad input.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

use driftgate_core::{
    AnthropicClassifier, AnthropicConfig, AzureOpenAiClassifier, AzureOpenAiConfig, Classifier,
    ClassifyRequest, Engine, EngineOptions, Evaluation, NoisePatterns, OllamaClassifier,
    OllamaConfig, PrIntent, RiskLevel, ThresholdConfig, DEFAULT_NOISE_THRESHOLD,
    DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL,
};

mod comment;
mod context;
mod gitdiff;
mod input;
mod platform;
mod render;

const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_DIFF_REF: &str = "HEAD~1";

#[derive(Parser)]
#[command(name = "driftgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Confidence-gated deployment risk verdicts for what-if output",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Risk level at which the drift bucket blocks deployment
    #[arg(long, value_enum, default_value_t = RiskArg::High)]
    drift_threshold: RiskArg,

    /// Risk level at which the intent bucket blocks deployment
    #[arg(long, value_enum, default_value_t = RiskArg::High)]
    intent_threshold: RiskArg,

    /// Risk level at which the operations bucket blocks deployment
    #[arg(long, value_enum, default_value_t = RiskArg::High)]
    operations_threshold: RiskArg,

    /// File of noise phrases, one per line, # comments allowed
    #[arg(long)]
    noise_file: Option<PathBuf>,

    /// Similarity ratio at which a noise phrase matches a record
    #[arg(long, default_value_t = DEFAULT_NOISE_THRESHOLD, value_parser = parse_ratio)]
    noise_threshold: f64,

    /// Read the code diff from a file instead of running git
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Git reference to diff against (default: detected PR base, else HEAD~1)
    #[arg(long)]
    diff_ref: Option<String>,

    /// Skip code diff collection entirely
    #[arg(long)]
    no_diff: bool,

    /// Directory of Bicep templates added as classification context
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Pull request title (auto-detected in CI when omitted)
    #[arg(long)]
    pr_title: Option<String>,

    /// Pull request description (auto-detected in CI when omitted)
    #[arg(long)]
    pr_description: Option<String>,

    /// Post the markdown report as a PR comment
    #[arg(long)]
    post_comment: bool,

    /// Title for the posted PR comment
    #[arg(long)]
    comment_title: Option<String>,

    /// GitHub PR URL to comment on (overrides CI auto-detection)
    #[arg(long)]
    pr_url: Option<String>,

    /// Classification backend provider
    #[arg(long, value_enum, default_value_t = ProviderArg::Anthropic)]
    provider: ProviderArg,

    /// Model identifier for the classification backend
    /// (Azure OpenAI: overrides AZURE_OPENAI_DEPLOYMENT)
    #[arg(long)]
    model: Option<String>,

    /// Backend endpoint URL
    /// (Azure OpenAI: overrides AZURE_OPENAI_ENDPOINT; Ollama: overrides OLLAMA_HOST)
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the Anthropic backend
    #[arg(long, env = "DRIFTGATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Deadline in seconds for each classifier call
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Anthropic,
    AzureOpenai,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RiskArg {
    Low,
    Medium,
    High,
}

impl From<RiskArg> for RiskLevel {
    fn from(arg: RiskArg) -> Self {
        match arg {
            RiskArg::Low => RiskLevel::Low,
            RiskArg::Medium => RiskLevel::Medium,
            RiskArg::High => RiskLevel::High,
        }
    }
}

/// Failure classes that decide the process exit code.
#[derive(Debug)]
enum CliFailure {
    /// Unusable input, exit 2.
    Input(String),

    /// Anything else; the gate fails closed, exit 1.
    Fatal(anyhow::Error),
}

impl From<anyhow::Error> for CliFailure {
    fn from(e: anyhow::Error) -> Self {
        Self::Fatal(e)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    driftgate_core::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(CliFailure::Input(message)) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
        Err(CliFailure::Fatal(e)) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<bool, CliFailure> {
    let change_text = input::read_stdin().map_err(|e| CliFailure::Input(e.to_string()))?;

    let ctx = platform::detect_platform();
    if let Some(p) = ctx.platform {
        info!(platform = p.display_name(), "platform detected");
    }

    let noise = match &cli.noise_file {
        Some(path) => Some(
            NoisePatterns::load(path)
                .map_err(|e| CliFailure::Input(format!("noise file {}: {e}", path.display())))?,
        ),
        None => None,
    };

    let request = build_request(&cli, &ctx, change_text)?;

    let classifier = build_classifier(&cli)?;

    let options = EngineOptions {
        thresholds: ThresholdConfig {
            drift: cli.drift_threshold.into(),
            intent: cli.intent_threshold.into(),
            operations: cli.operations_threshold.into(),
        },
        noise_threshold: cli.noise_threshold,
        call_timeout: Duration::from_secs(cli.timeout_secs),
    };
    let engine = Engine::new(classifier, options);

    let evaluation = engine
        .evaluate(request, noise.as_ref())
        .await
        .context("evaluation failed")?;

    print_evaluation(&cli, &evaluation)?;

    if cli.post_comment {
        let markdown = render::render_markdown(&evaluation, cli.comment_title.as_deref());
        // A failed comment never flips the verdict.
        if let Err(e) = comment::post_comment(&ctx, &markdown, cli.pr_url.as_deref()).await {
            warn!("could not post PR comment: {e}");
        } else {
            info!("posted PR comment");
        }
    }

    Ok(evaluation.verdict.safe)
}

/// Build the selected classification backend. Credential sources differ
/// per provider: Anthropic reads `DRIFTGATE_API_KEY` (or `--api-key`),
/// Azure OpenAI reads the `AZURE_OPENAI_*` variables, Ollama needs none.
/// `--endpoint` and `--model` override the provider's env or default.
fn build_classifier(cli: &Cli) -> Result<Arc<dyn Classifier>, CliFailure> {
    let classifier: Arc<dyn Classifier> = match cli.provider {
        ProviderArg::Anthropic => {
            let api_key = cli
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    CliFailure::Fatal(anyhow::anyhow!(
                        "no API key; set DRIFTGATE_API_KEY or pass --api-key"
                    ))
                })?;
            let endpoint = cli
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_ENDPOINT.to_string());
            let model = cli
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());
            Arc::new(
                AnthropicClassifier::new(AnthropicConfig::new(&endpoint, &model, api_key))
                    .context("failed to build classification client")?,
            )
        }
        ProviderArg::AzureOpenai => {
            let endpoint = cli
                .endpoint
                .clone()
                .or_else(|| env_nonempty("AZURE_OPENAI_ENDPOINT"));
            let deployment = cli
                .model
                .clone()
                .or_else(|| env_nonempty("AZURE_OPENAI_DEPLOYMENT"));
            let api_key = env_nonempty("AZURE_OPENAI_API_KEY");

            let mut missing = Vec::new();
            if endpoint.is_none() {
                missing.push("AZURE_OPENAI_ENDPOINT");
            }
            if api_key.is_none() {
                missing.push("AZURE_OPENAI_API_KEY");
            }
            if deployment.is_none() {
                missing.push("AZURE_OPENAI_DEPLOYMENT");
            }
            match (endpoint, deployment, api_key) {
                (Some(endpoint), Some(deployment), Some(api_key)) => Arc::new(
                    AzureOpenAiClassifier::new(AzureOpenAiConfig::new(
                        &endpoint,
                        &deployment,
                        &api_key,
                    ))
                    .context("failed to build classification client")?,
                ),
                _ => {
                    return Err(CliFailure::Fatal(anyhow::anyhow!(
                        "missing required environment variables: {}",
                        missing.join(", ")
                    )))
                }
            }
        }
        ProviderArg::Ollama => {
            let host = cli
                .endpoint
                .clone()
                .or_else(|| env_nonempty("OLLAMA_HOST"))
                .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
            let model = cli
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
            Arc::new(
                OllamaClassifier::new(OllamaConfig::new(&host, &model))
                    .context("failed to build classification client")?,
            )
        }
    };
    Ok(classifier)
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Clap parser for similarity ratios; matching is meaningless outside
/// the closed unit interval.
fn parse_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("`{s}` is not in the range 0.0 to 1.0"))
    }
}

/// Assemble the classification request from stdin, git, templates, and
/// PR metadata. Flags win over CI auto-detection.
fn build_request(
    cli: &Cli,
    ctx: &platform::PlatformContext,
    change_text: String,
) -> Result<ClassifyRequest, CliFailure> {
    let mut request = ClassifyRequest::new(change_text);

    let collect = !cli.no_diff
        && (cli.diff.is_some() || cli.diff_ref.is_some() || ctx.is_ci());
    if collect {
        let explicit = cli.diff_ref.as_deref().unwrap_or(DEFAULT_DIFF_REF);
        let diff_ref = gitdiff::resolve_diff_ref(explicit, ctx.base_branch.as_deref());
        let diff = gitdiff::collect_diff(cli.diff.as_deref(), &diff_ref)
            .map_err(CliFailure::Fatal)?;
        if !diff.is_empty() {
            request = request.with_diff(diff);
        }
    }

    if let Some(dir) = &cli.source_dir {
        if let Some(source_context) = context::collect_source_context(dir) {
            request = request.with_source_context(source_context);
        }
    }

    let intent = PrIntent {
        title: cli.pr_title.clone().or_else(|| ctx.pr_title.clone()),
        description: cli
            .pr_description
            .clone()
            .or_else(|| ctx.pr_description.clone()),
    };
    if intent.is_present() {
        request = request.with_intent(intent);
    }

    Ok(request)
}

fn print_evaluation(cli: &Cli, evaluation: &Evaluation) -> Result<(), CliFailure> {
    let output = match cli.format {
        OutputFormat::Json => {
            render::render_json(evaluation).context("failed to serialize evaluation")?
        }
        OutputFormat::Markdown => {
            render::render_markdown(evaluation, cli.comment_title.as_deref())
        }
        OutputFormat::Summary => render::render_summary(evaluation),
    };
    println!("{output}");
    Ok(())
}

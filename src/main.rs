use anyhow::Context;
use bizmatch::prelude::*;
use bizmatch_extract::openai::DEFAULT_BASE_URL;
use bizmatch_extract::{parse_reference, DEFAULT_JUDGE_MODEL, DEFAULT_TEXT_MODEL};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_REFERENCE_TIME: &str = "2025-10-01T14:32:10Z";

/// Business-name matching and extraction evaluation
#[derive(Parser, Debug)]
#[command(name = "bizmatch")]
#[command(about = "Match spoken business names and evaluate transaction extraction", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the evaluation dataset and write a per-row report
    Eval {
        /// Labeled dataset (CSV)
        #[arg(long)]
        data: PathBuf,

        /// Business catalog snapshot (JSON array)
        #[arg(long)]
        catalog: PathBuf,

        /// Report destination (CSV)
        #[arg(long, default_value = "eval.csv")]
        output: PathBuf,

        /// Rows evaluated concurrently
        #[arg(long, default_value_t = bizmatch_eval::DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// "Now" for relative dates
        #[arg(long, default_value = DEFAULT_REFERENCE_TIME)]
        reference_time: String,

        /// Model used for judgments
        #[arg(long, default_value = DEFAULT_JUDGE_MODEL)]
        judge_model: String,

        /// Directory with main.txt, business.txt, datetime.txt prompt overrides
        #[arg(long)]
        prompts: Option<PathBuf>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Aggregate an existing report
    Metrics {
        /// Report written by `eval`
        #[arg(long, default_value = "eval.csv")]
        input: PathBuf,

        /// Print metric keys and fractions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Match terms against the catalog
    Search {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Extract transaction fields from one text
    Extract {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long, default_value = DEFAULT_REFERENCE_TIME)]
        reference_time: String,

        text: String,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model used for extraction
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

impl LlmArgs {
    fn client(&self) -> anyhow::Result<Arc<OpenAiClient>> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("OPENAI_API_KEY is not set")?;
        let mut config = OpenAiConfig::new(api_key);
        config.base_url = self.base_url.clone();
        config.text_model = self.text_model.clone();
        config.timeout = Duration::from_secs(self.timeout_secs);
        Ok(Arc::new(OpenAiClient::new(config)?))
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Arc<CatalogIndex>> {
    let index = CatalogIndex::new(CatalogConfig::default());
    let count = index
        .load_json(path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;
    info!("Catalog loaded: {} records from {:?}", count, path);
    Ok(Arc::new(index))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Eval {
            data,
            catalog,
            output,
            concurrency,
            reference_time,
            judge_model,
            prompts,
            llm,
        } => {
            // Configuration problems abort before any row is evaluated
            let client = llm.client()?;
            let config = EvalConfig::default()
                .with_concurrency(concurrency)
                .with_reference_time(&reference_time)?;
            config.validate()?;
            let index = load_catalog(&catalog)?;
            let rows = load_rows(&data)?;
            info!("Loaded {} rows from {:?}", rows.len(), data);

            let mut extractor = Extractor::new(client.clone(), BusinessMatcher::new(index));
            if let Some(dir) = prompts {
                extractor = extractor.with_prompts(PromptSet::from_dir(dir)?);
            }
            let judge = ExtractionJudge::new(client).with_model(judge_model);
            let orchestrator = EvalOrchestrator::new(extractor, judge, config)?;

            let results = orchestrator.run(&rows).await;
            write_results(&output, &results)?;
            print!("{}", aggregate(&results));
        }
        Command::Metrics { input, json } => {
            let results = read_results(&input)?;
            let report = aggregate(&results);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::Search { catalog, terms } => {
            let index = load_catalog(&catalog)?;
            let candidates = BusinessMatcher::new(index).match_all(&terms).await;
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        }
        Command::Extract {
            catalog,
            reference_time,
            text,
            llm,
        } => {
            let client = llm.client()?;
            let reference = parse_reference(&reference_time)
                .with_context(|| format!("invalid reference time: {reference_time}"))?;
            let index = load_catalog(&catalog)?;
            let extractor = Extractor::new(client, BusinessMatcher::new(index));
            let draft = extractor.extract(&text, &reference).await;
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
    }

    Ok(())
}

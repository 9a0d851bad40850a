use std::time::Duration;

use anyhow::{Context, Result};
use askweb::config::{Config, ConfigError, DEFAULT_OLLAMA_HOST, OLLAMA_HOST_VAR, parse_num_results};
use askweb::doctor::ConfigHealth;
use askweb::{QueryAnswerer, doctor};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// askweb - answer questions from live web search with a local LLM
#[derive(Parser)]
#[command(name = "askweb")]
#[command(about = "Answer questions from web search results using a local Ollama model")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Search the web and answer one or more questions
    Ask(AskCommand),
    /// Check configuration and Ollama connectivity
    Doctor,
}

/// Answer questions
#[derive(Parser)]
struct AskCommand {
    /// The questions to answer, in order
    #[arg(value_name = "QUERY", required = true)]
    queries: Vec<String>,

    /// Number of search results used as context
    #[arg(short = 'n', long, value_name = "N", value_parser = parse_count)]
    num_results: Option<usize>,

    /// Ollama model to answer with (overrides OLLAMA_MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,

    /// Per-request HTTP timeout in seconds (no timeout by default)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print one JSON report per line instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Doctor => handle_doctor(),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "askweb=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs runtime failure).
///
/// User errors are configuration problems and invalid input.
/// Runtime failures include search provider and network errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ConfigError>().is_some() || error.to_string().contains("cannot be empty")
}

fn parse_count(raw: &str) -> Result<usize, String> {
    parse_num_results("--num-results", raw).map_err(|e| e.to_string())
}

/// Handles the ask command by answering each query in turn.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.queries.iter().any(|q| q.trim().is_empty()) {
        anyhow::bail!("Query cannot be empty");
    }

    let mut config = Config::from_env()?;
    apply_overrides(&mut config, cmd);

    let answerer = QueryAnswerer::from_config(&config, cmd.timeout.map(Duration::from_secs))?;

    execute_ask(&answerer, &cmd.queries, cmd.json)
}

fn apply_overrides(config: &mut Config, cmd: &AskCommand) {
    if let Some(model) = &cmd.model {
        config.model = Some(model.clone());
    }
    if let Some(num_results) = cmd.num_results {
        config.num_results = num_results;
    }
}

/// Executes the ask command logic with a constructed answerer.
///
/// Stops at the first query whose search fails.
fn execute_ask(answerer: &QueryAnswerer, queries: &[String], json: bool) -> Result<()> {
    for (i, query) in queries.iter().enumerate() {
        if json {
            let report = answerer
                .answer(query)
                .with_context(|| format!("Search failed for query: {query}"))?;
            println!("{}", serde_json::to_string(&report)?);
            continue;
        }

        if i > 0 {
            println!();
            println!("{}", "=".repeat(60));
            println!();
        }
        answerer
            .run(query)
            .with_context(|| format!("Search failed for query: {query}"))?;
    }

    Ok(())
}

/// Handles the doctor command. Checks Ollama even when configuration fails to load.
fn handle_doctor() -> Result<()> {
    let (health, ollama_host) = match Config::from_env() {
        Ok(config) => (ConfigHealth::from_config(&config), config.ollama_host),
        Err(e) => (
            ConfigHealth::from_error(&e),
            std::env::var(OLLAMA_HOST_VAR).unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string()),
        ),
    };

    doctor::run_health_checks(&health, &ollama_host)
}

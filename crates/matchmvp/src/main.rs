use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use matchmvp_agents::AgentLoop;
use matchmvp_models::MvpConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

#[derive(Parser, Debug)]
#[command(name = "matchmvp", about = "Find the MVP of a football match")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/matchmvp.toml")]
    config: String,

    /// Answer a single query and exit, e.g. "Real Madrid vs Barcelona on 2023-10-28"
    #[arg(short, long)]
    query: Option<String>,

    /// Print the full answer as JSON
    #[arg(long)]
    json: bool,

    /// Pretty-print the JSON output (implies --json)
    #[arg(long)]
    pretty: bool,
}

fn load_config(path: &str) -> Result<MvpConfig> {
    if !Path::new(path).exists() {
        warn!(path, "Config file not found, using defaults");
        return Ok(MvpConfig::default());
    }
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {path}"))
}

async fn answer_and_print(agent: &AgentLoop, input: &str, cli: &Cli) -> Result<()> {
    let answer = matchmvp::answer(agent, input)
        .await
        .map_err(|e| anyhow::anyhow!("Query failed: {e}"))?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&answer)?
    } else if cli.json {
        serde_json::to_string(&answer)?
    } else {
        answer.text
    };
    println!("{output}");
    Ok(())
}

async fn repl(agent: &AgentLoop, cli: &Cli) -> Result<()> {
    println!("Ask for a match MVP, e.g. \"Real Madrid vs Barcelona on 2023-10-28\". Type 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&input.to_lowercase().as_str()) {
            break;
        }

        // A failed query is reported and the session continues.
        if let Err(e) = answer_and_print(agent, input, cli).await {
            eprintln!("Error: {e:#}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    config
        .resolve_credentials(|key| std::env::var(key).ok())
        .context("Missing credentials")?;

    let agent = matchmvp::build_agent(&config).context("Failed to build agent")?;
    info!(model = %config.oracle.model, cache = config.cache.enabled, "Agent ready");

    match &cli.query {
        Some(query) => answer_and_print(&agent, query, &cli).await,
        None => repl(&agent, &cli).await,
    }
}

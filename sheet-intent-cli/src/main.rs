//! sheet-intent CLI
//!
//! Classify spreadsheet commands and route analytical queries from the
//! command line. Results are printed to stdout as pretty JSON; logs go to
//! stderr.
//!
//! Usage:
//!   sheet-intent classify "highlight duplicates in column A" --headers Name,Email
//!   sheet-intent route "compare average sales between regions" --workspace ws-1

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use sheet_intent::{
    CommandClassifier, EngineConfig, LlmConfig, RouteContext, SpreadsheetCommand,
    UniversalQueryRouter,
};

#[derive(Parser, Debug)]
#[command(name = "sheet-intent")]
#[command(about = "Classify spreadsheet commands and route data queries")]
struct Args {
    /// Path to engine configuration file (TOML format)
    #[arg(long, global = true, env = "SHEET_INTENT_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated header row of the current table
    #[arg(long, global = true, value_delimiter = ',')]
    headers: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a command into an intent
    Classify {
        text: String,

        /// Skip the LLM stage even if one is configured
        #[arg(long)]
        no_llm: bool,
    },
    /// Build an execution plan for a query
    Route {
        query: String,

        /// Workspace identifier attached to the routing context
        #[arg(long, env = "SHEET_INTENT_WORKSPACE")]
        workspace: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if config.classifier.llm.is_none() {
        config.classifier.llm = LlmConfig::from_env();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sheet_intent=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Classify { text, no_llm } => {
            if no_llm {
                config.classifier.llm = None;
            }
            let classifier = CommandClassifier::from_config(config.classifier);
            if !args.headers.is_empty() {
                classifier.update_columns(&args.headers);
            }
            let (classification, stage) = classifier.classify_with_stage(&text).await;
            let command = SpreadsheetCommand::from_classification(&classification);
            let output = json!({
                "classification": classification,
                "stage": stage,
                "command": command,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Route { query, workspace } => {
            let router = UniversalQueryRouter::new(config.router);
            let context = RouteContext {
                workspace_id: workspace,
                headers: args.headers,
                ..RouteContext::default()
            };
            let plan = router.route(&query, &context).await;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }
    Ok(())
}

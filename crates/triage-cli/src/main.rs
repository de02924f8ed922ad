use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use triage_core::{ConversationHistory, Workflow, WorkflowInput, WorkflowOutput};

mod config;

use config::TriageConfig;

#[derive(Parser)]
#[command(name = "triage")]
#[command(version)]
#[command(about = "Triage: classify a support message and answer it with the right agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workflow once and print the answer
    Ask {
        /// The message to route
        message: String,

        /// Print `{"output_text": ...}` instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Only classify a message and print its category
    Classify {
        /// The message to classify
        message: String,
    },

    /// Interactive conversation; each line is routed as a new turn
    Chat,

    /// Write the default config to ~/.triage/config.toml
    Init,

    /// Show current configuration (API key masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env in the working directory, if any
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only answers
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
        Commands::Ask { message, json } => cmd_ask(&cli.config, &message, json).await,
        Commands::Classify { message } => cmd_classify(&cli.config, &message).await,
        Commands::Chat => cmd_chat(&cli.config).await,
    }
}

/// Startup: load config, validate the credential, wire the workflow
fn build_workflow(config_path: &Option<PathBuf>) -> Result<Workflow> {
    let settings = TriageConfig::load(config_path)?
        .into_settings()
        .context("Invalid startup configuration")?;
    Ok(Workflow::from_settings(settings)?)
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        tokio::fs::write(&config_path, config::DEFAULT_CONFIG).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        info!("Created default config at {}", config_path.display());
    }

    println!("Triage initialized at {}", config_dir.display());
    println!(
        "Set OPENAI_API_KEY and TRIAGE_VECTOR_STORE_ID, or edit {}.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = TriageConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg.redacted())?);
    Ok(())
}

async fn cmd_ask(config_path: &Option<PathBuf>, message: &str, json: bool) -> Result<()> {
    let workflow = build_workflow(config_path)?;
    let output = workflow.run(WorkflowInput::new(message)).await?;
    print_output(&output, json)
}

fn print_output(output: &WorkflowOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        println!("{}", output.output_text);
    }
    Ok(())
}

async fn cmd_classify(config_path: &Option<PathBuf>, message: &str) -> Result<()> {
    let workflow = build_workflow(config_path)?;
    let result = workflow.classify(message).await?;
    println!("category: {}", result.category);
    println!("route:    {}", result.route());
    if !result.is_known() {
        println!("note:     unlisted category, handled by the general assistant");
    }
    Ok(())
}

async fn cmd_chat(config_path: &Option<PathBuf>) -> Result<()> {
    let workflow = build_workflow(config_path)?;
    let mut history: Option<ConversationHistory> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}: type a message, /reset to start over, /exit to quit.", workflow.name());

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                history = None;
                println!("(conversation cleared)");
                continue;
            }
            _ => {}
        }

        // A failed turn leaves the previous history untouched
        let result = match &history {
            None => workflow.run_detailed(WorkflowInput::new(line)).await,
            Some(existing) => {
                let mut next = existing.clone();
                workflow
                    .run_turn(&mut next, line)
                    .await
                    .map(|run| (run, next))
            }
        };

        match result {
            Ok((run, next)) => {
                info!(
                    "Turn handled by {} ({} tokens, {} items in history)",
                    run.agent,
                    run.usage.total(),
                    next.len()
                );
                println!("{}\n", run.output_text);
                history = Some(next);
            }
            Err(e) => {
                eprintln!("error: {}\n", e);
            }
        }
    }

    Ok(())
}

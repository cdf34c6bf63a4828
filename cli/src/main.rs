//! CLI entrypoint for conclave
//!
//! Wires the layers together with dependency injection and drives one
//! conversation to its decision, prompting on stdin whenever the team needs
//! the human.

use anyhow::{bail, Context, Result};
use clap::Parser;
use conclave_application::ports::event_sink::{EventSink, NoEventSink};
use conclave_application::{
    GenerationGateway, PhaseController, StartConversation, StartConversationInput,
    SubmitHumanReply,
};
use conclave_domain::{ConversationId, ConversationStatus as Status};
use conclave_infrastructure::{build_backend, ConfigLoader, InMemoryConversationStore, JsonlEventSink};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "conclave",
    about = "Multi-agent deliberation orchestrator with quorum-based decisions"
)]
struct Cli {
    /// The goal the team must resolve into a decision
    goal: Option<String>,

    /// Explicit config file path (highest priority)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Write a JSONL transcript of step events to this path
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Override the round budget
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let Some(goal) = cli.goal else {
        bail!("A goal is required, e.g.: conclave \"Pick a queueing technology for ingest\"");
    };

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    for issue in config.validate() {
        warn!("config: {}", issue);
    }

    let mut settings = config.settings();
    if let Some(max_rounds) = cli.max_rounds {
        settings.budgets.max_rounds = max_rounds;
    }
    let roster = config
        .roster()
        .map_err(|e| anyhow::anyhow!("invalid participant configuration: {}", e))?;

    // === Dependency injection ===
    let preferred = build_backend(&config.generation.preferred, &config)
        .with_context(|| format!("preferred backend '{}' unavailable", config.generation.preferred))?;
    let secondary = config
        .generation
        .secondary
        .as_deref()
        .and_then(|name| build_backend(name, &config));
    if secondary.is_none() {
        info!("no failover backend configured");
    }
    let gateway = Arc::new(GenerationGateway::new(
        preferred,
        secondary,
        config.generation.policy(),
    ));

    let store = Arc::new(InMemoryConversationStore::new());
    let sink: Arc<dyn EventSink> = match &cli.transcript {
        Some(path) => match JsonlEventSink::new(path) {
            Some(sink) => {
                info!("writing transcript to {}", path.display());
                Arc::new(sink)
            }
            None => Arc::new(NoEventSink),
        },
        None => Arc::new(NoEventSink),
    };

    let controller = PhaseController::new(
        store.clone(),
        gateway,
        sink.clone(),
        roster.clone(),
        settings,
    );
    let start = StartConversation::new(store.clone(), sink.clone());
    let submit = SubmitHumanReply::new(store.clone(), sink);

    // === Run one conversation ===
    let id = ConversationId::new(format!(
        "conv-{}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let conversation = start
        .execute(StartConversationInput {
            id: id.clone(),
            goal,
        })
        .await?;

    println!("Conversation {} started", conversation.id());
    println!("Goal: {}", conversation.goal());
    println!("Team: {}", describe_roster(&roster));
    println!();

    loop {
        let outcome = controller.advance(&id).await?;

        for message in &outcome.appended {
            let name = roster
                .get(&message.sender_id.as_str().into())
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| message.sender_id.clone());
            println!("[{}] {}: {}", message.category, name, message.content);
            println!();
        }

        match outcome.conversation.status() {
            Status::Active => continue,
            Status::AwaitingHuman => {
                let reply = prompt_human()?;
                submit.execute(&id, reply).await?;
            }
            Status::Completed => {
                println!("=== Decision ===");
                println!("{}", outcome.conversation.final_summary().unwrap_or(""));
                break;
            }
            Status::Aborted => {
                println!("=== Conversation aborted ===");
                println!("{}", outcome.conversation.final_summary().unwrap_or(""));
                break;
            }
        }
    }

    Ok(())
}

fn describe_roster(roster: &conclave_domain::Roster) -> String {
    roster
        .members()
        .iter()
        .map(|p| format!("{} ({})", p.name(), p.role()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn prompt_human() -> Result<String> {
    print!("The team needs your input > ");
    std::io::stdout().flush()?;
    let mut reply = String::new();
    std::io::stdin().read_line(&mut reply)?;
    Ok(reply.trim().to_string())
}

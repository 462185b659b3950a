//! Demo/manual entry point: wires the in-memory store, in-memory vector
//! index, and a model client (live Gemini/Claude if an API key is present in
//! the environment, otherwise a deterministic mock) into one
//! [`ConversationPipeline`] and drives it from the terminal.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use weave_config::{AppConfig, LlmProvider};
use weave_core::{ProfileId, Session, SessionId, SystemMessage, SystemMessageKind};
use weave_llm::{ClaudeClient, GeminiClient, ModelClient, MockModelClient};
use weave_pipeline::ConversationPipeline;
use weave_store::{ConversationStore, InMemoryStore};
use weave_vector::{InMemoryVectorStore, VectorStore};

#[derive(Debug, Parser)]
#[command(name = "weave", version, about = "Conversation enrichment and request-assembly pipeline")]
struct Cli {
    /// Path to a TOML configuration file. Falls back to built-in defaults if
    /// the file does not exist.
    #[arg(long, default_value = "config/weave.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive read-eval-print loop over one demo session.
    Chat,
    /// Run a single turn with the given input and print the response.
    Run {
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        AppConfig::load_from(&cli.config)?
    } else {
        tracing::info!(path = %cli.config.display(), "no configuration file found, using defaults");
        AppConfig::default()
    };

    let store = Arc::new(InMemoryStore::new());
    let vector_store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let model = build_model_client(&config);

    let session_id = seed_demo_session(&store, &config).await;

    let pipeline = ConversationPipeline::new(
        Arc::clone(&store) as Arc<dyn ConversationStore>,
        vector_store,
        model,
        config,
    );

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat_loop(&pipeline, session_id).await,
        Commands::Run { input } => {
            let turn = pipeline.run_turn(session_id, input, CancellationToken::new()).await?;
            println!("{}", turn.response.unwrap_or_default());
            Ok(())
        }
    }
}

fn build_model_client(config: &AppConfig) -> Arc<dyn ModelClient> {
    match config.llm_provider {
        LlmProvider::Gemini => {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                return Arc::new(GeminiClient::new(key, config.gemini_model.clone()));
            }
        }
        LlmProvider::Claude => {
            if let Ok(key) = std::env::var("CLAUDE_API_KEY") {
                return Arc::new(ClaudeClient::new(key, config.claude_model.clone()));
            }
        }
    }
    tracing::warn!(
        provider = ?config.llm_provider,
        "no API key found in the environment, falling back to the mock model client"
    );
    Arc::new(MockModelClient::always_replying(
        "(mock reply — set GEMINI_API_KEY or CLAUDE_API_KEY for a live model)",
    ))
}

async fn seed_demo_session(store: &InMemoryStore, config: &AppConfig) -> SessionId {
    let session_id = SessionId::new(1);
    store
        .insert_session(Session {
            id: session_id,
            profile_id: ProfileId::new(1),
            active_persona_id: config.active_persona_id,
            created_at: Utc::now(),
        })
        .await;
    store
        .insert_persona(SystemMessage {
            id: 1,
            profile_id: ProfileId::GLOBAL,
            kind: SystemMessageKind::Persona,
            name: Some("Weave".to_string()),
            content: "You are Weave, a helpful and direct conversational assistant.".to_string(),
            is_active: true,
        })
        .await;
    session_id
}

async fn run_chat_loop(pipeline: &ConversationPipeline, session_id: SessionId) -> Result<()> {
    println!("weave chat — type a message and press enter (Ctrl-D or 'exit' to quit)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match pipeline.run_turn(session_id, input.to_string(), CancellationToken::new()).await {
            Ok(turn) => println!("{}", turn.response.unwrap_or_default()),
            Err(error) => eprintln!("turn failed: {error}"),
        }
    }
    Ok(())
}

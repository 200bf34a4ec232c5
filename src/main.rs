// src/main.rs

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use attune::chat::{PreferencesPatch, Sender};
use attune::config::CONFIG;
use attune::engine::{ChatEngine, CrisisNotifier, EngineOptions, TurnOutcome};
use attune::llm::{LanguageModel, OpenAiClient};
use attune::mood::{self, MoodTrend};
use attune::storage::{ConversationStore, JsonFileStore, SqliteStore};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "attune")]
#[command(about = "Empathetic chat companion with sentiment-aware replies", long_about = None)]
struct Cli {
    /// Keep conversations in this JSON file instead of SQLite
    #[arg(long)]
    json_store: Option<PathBuf>,

    /// SQLite database URL (defaults to the configured DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Run without the remote model, local heuristics and templates only
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// ISO 639-1 code replies should be written in
    #[arg(long)]
    language: Option<String>,

    /// Fix the RNG seed for reproducible greeting and template selection
    #[arg(long)]
    seed: Option<u64>,
}

struct TerminalCrisisNotifier;

impl CrisisNotifier for TerminalCrisisNotifier {
    fn notify(&self, resources: &str) {
        eprintln!();
        eprintln!("*** {} ***", resources);
        eprintln!();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = CONFIG.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting attune");
    info!("Model: {}", CONFIG.model);

    let store: Arc<dyn ConversationStore> = match &cli.json_store {
        Some(path) => Arc::new(JsonFileStore::new(path.clone())),
        None => {
            let url = cli
                .database_url
                .clone()
                .unwrap_or_else(|| CONFIG.database_url.clone());
            Arc::new(SqliteStore::connect(&url).await?)
        }
    };

    let provider: Option<Arc<dyn LanguageModel>> = if cli.offline {
        info!("Offline mode: remote model disabled");
        None
    } else {
        match OpenAiClient::from_env() {
            Some(client) => Some(Arc::new(client)),
            None => {
                warn!("OPENAI_API_KEY not set, using local heuristics and templates");
                None
            }
        }
    };

    let mut options = EngineOptions::default();
    options.rng_seed = cli.seed;
    if let Some(language) = &cli.language {
        options.preferences.preferred_language = language.clone();
    }

    let engine = ChatEngine::new(store, provider, options)
        .await
        .with_crisis_notifier(Arc::new(TerminalCrisisNotifier));

    run_repl(&engine).await?;

    engine.await_background_tasks().await;
    Ok(())
}

async fn run_repl(engine: &ChatEngine) -> anyhow::Result<()> {
    println!("attune - type a message, or /help for commands");

    let view = engine.view_state().await;
    if let Some(active) = &view.active_conversation {
        println!("Resuming \"{}\"", active.title);
        if let Some(last) = active.messages.last() {
            println!("{}", last.content);
        }
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if !run_command(engine, command).await? {
                break;
            }
            continue;
        }

        match engine.send_message(input, None).await {
            TurnOutcome::Reply { content, sentiment, .. } => {
                println!("[{}] {}", sentiment.sentiment, content);
            }
            TurnOutcome::ConversationStarted { .. } => {
                print_greeting(engine).await;
                println!("(send your message again to start the conversation)");
            }
            TurnOutcome::Ignored => {}
        }
    }

    Ok(())
}

/// Executes one slash command. Returns false when the REPL should exit.
async fn run_command(engine: &ChatEngine, command: &str) -> anyhow::Result<bool> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let argument = parts.next();

    match name {
        "help" => {
            println!("/new            start a new conversation");
            println!("/list           list conversations");
            println!("/switch <n>     switch to conversation n");
            println!("/delete <n>     delete conversation n");
            println!("/mood           show mood records and trend");
            println!("/suggest        show conversation suggestions");
            println!("/lang <code>    set the preferred reply language");
            println!("/speak          save the last reply as speech audio");
            println!("/quit           exit");
        }
        "new" => {
            engine.new_conversation().await;
            print_greeting(engine).await;
        }
        "list" => {
            let view = engine.view_state().await;
            if view.conversations.is_empty() {
                println!("no conversations yet");
            }
            let active_id = view.active_conversation.as_ref().map(|c| c.id.clone());
            for (position, conversation) in view.conversations.iter().enumerate() {
                let marker = if Some(&conversation.id) == active_id.as_ref() {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}. {} ({} messages)",
                    marker,
                    position + 1,
                    conversation.title,
                    conversation.messages.len()
                );
            }
        }
        "switch" => match conversation_id_at(engine, argument).await {
            Some(id) => {
                engine.select_conversation(&id).await?;
                let view = engine.view_state().await;
                if let Some(active) = view.active_conversation {
                    println!("switched to \"{}\"", active.title);
                }
            }
            None => println!("usage: /switch <n>"),
        },
        "delete" => match conversation_id_at(engine, argument).await {
            Some(id) => {
                engine.delete_conversation(&id).await?;
                println!("deleted");
            }
            None => println!("usage: /delete <n>"),
        },
        "mood" => {
            let view = engine.view_state().await;
            if view.mood_records.is_empty() {
                println!("no mood data yet");
            }
            for record in &view.mood_records {
                println!(
                    "{}: {:+.2} ({} messages)",
                    record.date,
                    record.average_score,
                    record.sentiment_counts.values().sum::<u32>()
                );
            }
            let trend = match mood::trend(&view.mood_records) {
                MoodTrend::Improving => "improving",
                MoodTrend::Declining => "declining",
                MoodTrend::Stable => "stable",
            };
            println!(
                "trend: {}, weekly average: {:.0}/100",
                trend,
                mood::weekly_average(&view.mood_records)
            );
        }
        "suggest" => {
            let view = engine.view_state().await;
            for suggestion in &view.suggestions {
                println!("- {}", suggestion.text);
            }
        }
        "lang" => match argument {
            Some(code) => {
                let patch = PreferencesPatch {
                    preferred_language: Some(code.to_string()),
                    ..Default::default()
                };
                engine.update_preferences(patch).await;
                println!("replies will be in '{}'", code);
            }
            None => println!("usage: /lang <code>"),
        },
        "speak" => match last_reply_id(engine).await {
            Some(message_id) => match engine.synthesize_message(&message_id).await {
                Ok(audio) => {
                    tokio::fs::write("reply.mp3", &audio).await?;
                    println!("saved reply.mp3 ({} bytes)", audio.len());
                }
                Err(e) => println!("speech unavailable: {:#}", e),
            },
            None => println!("no reply to speak yet"),
        },
        "quit" | "exit" => return Ok(false),
        other => println!("unknown command '/{}', try /help", other),
    }

    Ok(true)
}

async fn print_greeting(engine: &ChatEngine) {
    let view = engine.view_state().await;
    if let Some(active) = view.active_conversation {
        if let Some(greeting) = active.messages.first() {
            println!("{}", greeting.content);
        }
    }
}

/// Resolves a 1-based position from `/list` into a conversation id.
async fn conversation_id_at(engine: &ChatEngine, argument: Option<&str>) -> Option<String> {
    let position: usize = argument?.parse().ok()?;
    let view = engine.view_state().await;
    view.conversations
        .get(position.checked_sub(1)?)
        .map(|c| c.id.clone())
}

async fn last_reply_id(engine: &ChatEngine) -> Option<String> {
    let view = engine.view_state().await;
    view.active_conversation?
        .messages
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Bot)
        .map(|m| m.id.clone())
}

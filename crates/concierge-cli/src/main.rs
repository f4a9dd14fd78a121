//! Concierge CLI - clinic knowledge retrieval and offline chat

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use concierge_core::chat::{ChatService, Conversation, OfflineGenerator, Reply};
use concierge_core::config::{API_KEY_ENV, Config};
use concierge_core::diagnostics::Diagnostics;
use concierge_core::knowledge::{KnowledgeBase, Retriever, ScoringVariant};
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "concierge")]
#[command(author, version, about = "Voice clinic concierge - knowledge retrieval and chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve the most relevant knowledge entries for a query
    Retrieve {
        /// Free-text query
        query: String,
        /// Maximum number of entries (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Scoring variant (overlap or keyword)
        #[arg(long)]
        variant: Option<ScoringVariant>,
        /// Show similarity scores
        #[arg(long)]
        scores: bool,
    },

    /// Score every entry against a query, highest first
    Rank {
        /// Free-text query
        query: String,
        /// Scoring variant (overlap or keyword)
        #[arg(long)]
        variant: Option<ScoringVariant>,
    },

    /// Print the system prompt that would accompany a message
    Prompt {
        /// User message
        message: String,
    },

    /// Inspect the knowledge collection
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeAction,
    },

    /// Interactive chat session (offline replies)
    Chat,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum KnowledgeAction {
    /// List all entries
    List,
    /// Show one entry
    Show { id: u32 },
    /// Validate a knowledge file (defaults to the configured collection)
    Validate { path: Option<PathBuf> },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let directive = if cli.verbose {
        "concierge=debug"
    } else {
        "concierge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Retrieve {
            query,
            top_k,
            variant,
            scores,
        } => cmd_retrieve(&query, top_k, variant, scores, out),

        Commands::Rank { query, variant } => cmd_rank(&query, variant, out),

        Commands::Prompt { message } => cmd_prompt(&message),

        Commands::Knowledge { action } => cmd_knowledge(action, out),

        Commands::Chat => cmd_chat(out).await,

        Commands::Config { action } => cmd_config(action, out),

        Commands::Doctor => cmd_doctor(out),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Retriever built from config, with an optional variant override
fn load_retriever(variant: Option<ScoringVariant>) -> anyhow::Result<Retriever> {
    let mut config = Config::load()?;
    if let Some(variant) = variant {
        config.retrieval.variant = variant;
    }
    config.build_retriever()
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_retrieve(
    query: &str,
    top_k: Option<usize>,
    variant: Option<ScoringVariant>,
    scores: bool,
    out: Output,
) -> anyhow::Result<()> {
    let retriever = load_retriever(variant)?;
    let top_k = top_k.unwrap_or(retriever.top_k());
    let results = retriever.retrieve_scored(query, top_k);

    if out.json() {
        if scores {
            return print_json(&results);
        }
        let entries: Vec<_> = results.iter().map(|s| s.entry).collect();
        return print_json(&entries);
    }

    if results.is_empty() {
        if !out.quiet {
            println!(
                "No matching knowledge ({} scoring, threshold {}).",
                retriever.variant(),
                retriever.variant().threshold()
            );
        }
        return Ok(());
    }

    for scored in &results {
        let entry = scored.entry;
        if scores {
            println!("{:>8.4}  [{}] {}", scored.score, entry.id, entry.topic);
        } else {
            println!("[{}] {} ({})", entry.id, entry.topic, entry.category);
        }
        if !out.quiet {
            println!("    {}", entry.content.trim());
        }
    }
    Ok(())
}

fn cmd_rank(query: &str, variant: Option<ScoringVariant>, out: Output) -> anyhow::Result<()> {
    let retriever = load_retriever(variant)?;
    let ranked = retriever.rank(query);

    if out.json() {
        return print_json(&ranked);
    }

    let threshold = retriever.variant().threshold();
    if !out.quiet {
        println!(
            "Ranking {} entries ({} scoring, threshold {})",
            ranked.len(),
            retriever.variant(),
            threshold
        );
        println!();
    }
    for scored in &ranked {
        let marker = if scored.score > threshold { '*' } else { ' ' };
        println!(
            "{} {:>8.4}  [{}] {}",
            marker, scored.score, scored.entry.id, scored.entry.topic
        );
    }
    Ok(())
}

fn cmd_prompt(message: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let retriever = config.build_retriever()?;
    let entries = retriever.search(message);
    debug!(retrieved = entries.len(), "Building prompt");
    println!("{}", config.build_prompt().build(&entries));
    Ok(())
}

fn cmd_knowledge(action: KnowledgeAction, out: Output) -> anyhow::Result<()> {
    match action {
        KnowledgeAction::List => {
            let knowledge = Config::load()?.load_knowledge()?;
            if out.json() {
                return print_json(knowledge.entries());
            }
            for entry in &knowledge {
                println!("[{:>2}] {:<28} {}", entry.id, entry.topic, entry.category);
            }
            if !out.quiet {
                println!("\n{} entries", knowledge.len());
            }
        }
        KnowledgeAction::Show { id } => {
            let knowledge = Config::load()?.load_knowledge()?;
            let entry = knowledge
                .get(id)
                .map_err(|e| anyhow!("[{}] {}", e.code(), e))?;
            if out.json() {
                return print_json(entry);
            }
            println!("Entry {}", entry.id);
            println!("  Topic: {}", entry.topic);
            println!("  Category: {}", entry.category);
            println!();
            println!("{}", entry.content.trim());
        }
        KnowledgeAction::Validate { path } => {
            let (knowledge, source) = match path {
                Some(path) => {
                    let knowledge = KnowledgeBase::load(&path).map_err(|e| {
                        let hint = e.suggestion().unwrap_or_default();
                        anyhow!("[{}] {} {}", e.code(), e, hint)
                    })?;
                    (knowledge, path.display().to_string())
                }
                None => {
                    let config = Config::load()?;
                    let source = config
                        .knowledge
                        .path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in".to_string());
                    (config.load_knowledge()?, source)
                }
            };
            if out.json() {
                return print_json(&serde_json::json!({
                    "valid": true,
                    "source": source,
                    "entries": knowledge.len(),
                    "categories": knowledge.categories(),
                }));
            }
            if !out.quiet {
                println!(
                    "Knowledge collection is valid: {} entries ({})",
                    knowledge.len(),
                    source
                );
            }
        }
        KnowledgeAction::Categories => {
            let knowledge = Config::load()?.load_knowledge()?;
            let categories = knowledge.categories();
            if out.json() {
                return print_json(&categories);
            }
            for category in categories {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

async fn cmd_chat(out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let service = ChatService::new(
        config.build_retriever()?,
        config.build_prompt(),
        OfflineGenerator,
    )
    .with_history_limit(config.chat.history_limit)
    .with_generation_options(config.chat.generation_options());
    let mut conversation = Conversation::new();

    if !out.quiet {
        println!("Concierge chat (offline mode)");
        println!("Type /clear to start over, /quit to exit.");
        println!();
    }

    let mut editor = rustyline::DefaultEditor::new().context("Failed to start line editor")?;
    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let message = line.trim();
        match message {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                conversation.clear();
                if !out.quiet {
                    println!("Conversation cleared.");
                }
                continue;
            }
            _ => {}
        }
        if let Err(e) = editor.add_history_entry(message) {
            warn!(error = %e, "Failed to record line history");
        }

        let reply = service.respond_in(&mut conversation, message).await?;
        print_reply(&reply, out)?;
    }
    Ok(())
}

fn print_reply(reply: &Reply, out: Output) -> anyhow::Result<()> {
    if out.json() {
        return print_json(reply);
    }
    println!("concierge> {}", reply.text);
    if !out.quiet && !reply.knowledge_ids.is_empty() {
        println!("           (knowledge: {:?})", reply.knowledge_ids);
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !out.quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if out.json() {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                return print_json(&map);
            }
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !out.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn cmd_doctor(out: Output) -> anyhow::Result<()> {
    let diagnostics = Diagnostics::collect();
    if out.json() {
        return print_json(&diagnostics);
    }

    let quiet = out.quiet;
    if !quiet {
        println!("Concierge Health Check");
        println!("======================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }

            // Check API key
            match config.chat.redacted_api_key() {
                Ok(Some(redacted)) => {
                    if !quiet {
                        println!("[OK] API Key: Configured ({})", redacted);
                    }
                    if !diagnostics.api_key_looks_valid() {
                        all_ok = false;
                        if !quiet {
                            println!(
                                "[!!] API Key: Unexpected format (expected {})",
                                diagnostics.expected_key_format
                            );
                        }
                    }
                }
                Ok(None) => {
                    all_ok = false;
                    if !quiet {
                        warn!("API Key: Not configured");
                        println!("[!!] API Key: Not configured");
                        println!("     Set the {} environment variable", API_KEY_ENV);
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] API Key: Error - {}", e);
                    }
                }
            }

            // Check knowledge collection
            match config.load_knowledge() {
                Ok(knowledge) => {
                    if !quiet {
                        println!(
                            "[OK] Knowledge: {} entries, {} categories",
                            knowledge.len(),
                            knowledge.categories().len()
                        );
                        println!(
                            "     Scoring: {} (top {})",
                            config.retrieval.variant, config.retrieval.top_k
                        );
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Knowledge: Error - {:#}", e);
                    }
                }
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Environment report
    if !quiet {
        println!();
        println!("Environment");
        println!("  Version: {}", diagnostics.version);
        println!("  Checked at: {}", diagnostics.timestamp.to_rfc3339());
        println!("  API key prefix: {}", diagnostics.api_key_prefix);
        println!("  API key length: {}", diagnostics.api_key_length);
        println!("  Variables visible: {}", diagnostics.env_vars.len());
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}

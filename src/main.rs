use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docchat_core::{AskOptions, ProviderKind, ProviderTestResult, VectorStore};
use docchat_llm::{LlmConfig, build_registry};
use docchat_rag::{
    DocumentLoader, RagEngine, StoreBackend, StoreConfig, build_vector_store, ingest_directory,
};
use docchat_server::{ServerConfig, logging, serve};

/// Documents sent to the store per `add_documents` call during ingestion
const INGEST_BATCH_SIZE: usize = 16;

#[derive(Parser)]
#[command(name = "docchat", version)]
#[command(about = "Retrieval-augmented documentation chatbot backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Documentation directory to load into the store at startup
        #[arg(long)]
        docs: Option<PathBuf>,
    },
    /// Load a documentation directory into the vector store
    Ingest {
        /// Directory containing .md, .txt or .html files
        dir: PathBuf,
        /// Source label for every document instead of its relative path
        #[arg(long)]
        source: Option<String>,
        /// Delete the collection before ingesting
        #[arg(long)]
        reset: bool,
    },
    /// Answer a question from the knowledge base
    Ask {
        question: String,
        /// Provider to use instead of the default
        #[arg(short, long)]
        provider: Option<ProviderKind>,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=10))]
        max_docs: u64,
        /// Print the retrieved context and scores
        #[arg(long)]
        show_context: bool,
        /// Documentation directory to load into the store first
        #[arg(long)]
        docs: Option<PathBuf>,
    },
    /// Show the context retrieved for a question without calling a provider
    Context {
        question: String,
        #[arg(short = 'k', long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=10))]
        max_docs: u64,
        /// Documentation directory to load into the store first
        #[arg(long)]
        docs: Option<PathBuf>,
    },
    /// List configured providers
    Providers,
    /// Send a smoke-test message to one provider, or to all of them
    TestProvider {
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Show collection information
    Info,
    /// Delete the collection and every stored chunk
    Reset {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve { docs: None });

    let server_config = ServerConfig::from_env().context("invalid server configuration")?;
    let default_filter = match command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    logging::init(server_config.log_dir.as_deref(), default_filter)?;

    match command {
        Commands::Serve { docs } => {
            let engine = build_engine(docs.as_deref()).await?;
            serve(server_config, Arc::new(engine))
                .await
                .context("server error")?;
        }
        Commands::Ingest { dir, source, reset } => ingest(dir, source, reset).await?,
        Commands::Ask {
            question,
            provider,
            max_docs,
            show_context,
            docs,
        } => {
            let engine = build_engine(docs.as_deref()).await?;
            let options = AskOptions {
                provider,
                max_context_docs: max_docs as usize,
                include_context: show_context,
            };
            println!("{} Thinking...", "🤖".blue());
            let response = engine.ask_question(&question, options).await?;

            if let Some(details) = &response.details {
                println!("{}", "Context:".bold());
                println!("{}", details.context.dimmed());
                println!();
            }
            println!("{}", response.response);
            println!();
            print_sources(&response.sources);
            println!(
                "{} {}",
                "Provider:".bold(),
                response.metadata.provider.display_name()
            );
        }
        Commands::Context {
            question,
            max_docs,
            docs,
        } => {
            let engine = build_engine(docs.as_deref()).await?;
            let result = engine
                .get_context_for_question(&question, max_docs as usize)
                .await?;
            println!("{}", result.context);
            println!();
            println!("{} {}", "Documents:".bold(), result.document_count);
            print_sources(&result.sources);
        }
        Commands::Providers => {
            let engine = build_engine(None).await?;
            let default = engine.default_provider();
            println!("{}", "Available providers:".bold());
            for provider in engine.available_providers() {
                let marker = if provider == default {
                    " (default)".green().to_string()
                } else {
                    String::new()
                };
                println!("  {} {}{}", "•".cyan(), provider, marker);
            }
        }
        Commands::TestProvider { name, all } => {
            let engine = build_engine(None).await?;
            let results = match name {
                Some(name) if !all => vec![engine.test_provider(&name).await],
                _ => engine.test_all_providers().await,
            };
            for result in &results {
                print_test_result(result);
            }
        }
        Commands::Info => {
            let config = StoreConfig::from_env()?;
            config.require_persistent("info")?;
            let store = open_store(&config).await?;
            let info = store.collection_info();
            println!("{}", "Collection:".bold());
            println!("  {} {}", "name:".cyan(), info.name);
            println!("  {} {}", "backend:".cyan(), info.backend);
            println!("  {} {}", "initialized:".cyan(), info.initialized);
            println!("  {} {:?}", "embeddings:".cyan(), config.embedding);
            println!(
                "  {} {} / {}",
                "chunking:".cyan(),
                config.indexing.chunk_size,
                config.indexing.chunk_overlap
            );
        }
        Commands::Reset { yes } => {
            if !yes {
                println!(
                    "{} This deletes every stored chunk. Re-run with --yes to confirm.",
                    "⚠️".yellow()
                );
                return Ok(());
            }
            let config = StoreConfig::from_env()?;
            config.require_persistent("reset")?;
            let store = build_vector_store(&config)?;
            store.delete_collection().await?;
            println!(
                "{} Deleted collection {}",
                "✅".green(),
                config.collection_name.bold()
            );
        }
    }

    Ok(())
}

/// Store from environment configuration, connected and ready
async fn open_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let store = build_vector_store(config).context("invalid vector store configuration")?;
    store
        .initialize()
        .await
        .with_context(|| format!("failed to open collection '{}'", config.collection_name))?;
    Ok(store)
}

/// Engine over the configured store, optionally preloaded from `docs`
async fn build_engine(docs: Option<&Path>) -> Result<RagEngine> {
    let llm_config = LlmConfig::from_env().context("invalid LLM configuration")?;
    let registry = build_registry(&llm_config).context("no usable LLM provider")?;

    let store_config = StoreConfig::from_env()?;
    let store = open_store(&store_config).await?;

    match docs {
        Some(dir) => {
            let loader = DocumentLoader::new()?;
            let (documents, chunks) = ingest_directory(store.as_ref(), &loader, dir)
                .await
                .with_context(|| format!("failed to load {}", dir.display()))?;
            eprintln!(
                "{} Loaded {} documents ({} chunks) from {}",
                "📚".blue(),
                documents,
                chunks,
                dir.display()
            );
        }
        None if store_config.backend == StoreBackend::Memory => {
            eprintln!(
                "{} VECTOR_STORE=memory starts empty; pass --docs <dir> to load documentation",
                "⚠️".yellow()
            );
        }
        None => {}
    }

    Ok(RagEngine::new(store, Arc::new(registry)))
}

async fn ingest(dir: PathBuf, source: Option<String>, reset: bool) -> Result<()> {
    let config = StoreConfig::from_env()?;
    config.require_persistent("ingest")?;

    if reset {
        build_vector_store(&config)?.delete_collection().await?;
        println!("{} Collection {} reset", "🗑️".yellow(), config.collection_name);
    }
    let store = open_store(&config).await?;

    let mut loader = DocumentLoader::new()?;
    if let Some(label) = source {
        loader = loader.with_source_label(label);
    }
    let documents = loader
        .load_directory(&dir)
        .with_context(|| format!("failed to load {}", dir.display()))?;

    if documents.is_empty() {
        println!("{} No supported files found in {}", "⚠️".yellow(), dir.display());
        return Ok(());
    }

    println!(
        "{} Ingesting {} documents from {}",
        "📚".blue(),
        documents.len(),
        dir.display()
    );

    let mut total = 0;
    for batch in documents.chunks(INGEST_BATCH_SIZE) {
        total += store.add_documents(batch).await?;
        for document in batch {
            println!("  {} {}", "•".cyan(), document.metadata.source);
        }
    }

    println!(
        "{} Stored {} chunks in {}",
        "✅".green(),
        total,
        config.collection_name.bold()
    );
    Ok(())
}

fn print_sources(sources: &[String]) {
    if sources.is_empty() {
        println!("{} none", "Sources:".bold());
        return;
    }
    println!("{}", "Sources:".bold());
    for source in sources {
        println!("  {} {}", "•".cyan(), source);
    }
}

fn print_test_result(result: &ProviderTestResult) {
    if result.success {
        println!(
            "{} {}: {}",
            "✅".green(),
            result.provider.bold(),
            result.response.as_deref().unwrap_or_default()
        );
    } else {
        println!(
            "{} {}: {}",
            "❌".red(),
            result.provider.bold(),
            result.error.as_deref().unwrap_or("unknown error").red()
        );
    }
}

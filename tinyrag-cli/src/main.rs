//! tinyrag CLI - thin front end over the retrieval library
//!
//! # Commands
//!
//! ```bash
//! # Chunk a document and show results
//! tinyrag chunk notes.txt --max-chunk-size 200 --overlap 40
//!
//! # Add a document to the persisted store
//! tinyrag --storage vectorstore/store.json ingest notes.txt
//!
//! # Ask the persisted store a question
//! tinyrag --storage vectorstore/store.json query "what is RAG?" -k 3
//!
//! # Demo: index a file and search it in memory
//! tinyrag demo notes.txt "who scored"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tinyrag_lib::{
    chunk::Chunker,
    config::PipelineConfig,
    embed::{Embedder, HashEmbedder, DEFAULT_HASH_DIMENSION},
    pipeline::RetrievalPipeline,
    store::SearchResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinyrag")]
#[command(about = "Chunk, embed and search text documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Maximum chunk size in characters (overrides config)
    #[arg(long, global = true)]
    max_chunk_size: Option<usize>,

    /// Target chunk overlap in characters (overrides config)
    #[arg(long, global = true)]
    overlap: Option<usize>,

    /// Snapshot file for the vector store (overrides config)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Hash, global = true)]
    embedder: EmbedderKind,

    /// Vector dimension for the hash embedder
    #[arg(long, default_value_t = DEFAULT_HASH_DIMENSION, global = true)]
    dimension: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Deterministic feature hashing, no model download
    Hash,
    /// sentence-transformers/all-MiniLM-L6-v2 (needs the `fastembed` feature)
    Minilm,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a document and print the chunks
    Chunk {
        /// Input file to chunk
        input: PathBuf,
    },

    /// Chunk, embed and store a document, then persist the store
    Ingest {
        /// Input file to index
        input: PathBuf,

        /// Document identifier (defaults to the file name)
        #[arg(short, long)]
        document_id: Option<String>,
    },

    /// Query the persisted store
    Query {
        /// Question to search for
        question: String,

        /// Number of results to return (defaults to config top_k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Demo: index a file and search it (all in one command, nothing persisted)
    Demo {
        /// Input file to index
        input: PathBuf,

        /// Query to search for
        query: String,

        /// Number of results to return (defaults to config top_k)
        #[arg(short, long)]
        k: Option<usize>,
    },
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(size) = self.max_chunk_size {
            config.max_chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            config.chunk_overlap = overlap;
        }
        if let Some(storage) = &self.storage {
            config.storage_path = Some(storage.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn build_embedder(&self) -> Result<Box<dyn Embedder>> {
        match self.embedder {
            EmbedderKind::Hash => Ok(Box::new(HashEmbedder::new(self.dimension))),
            #[cfg(feature = "fastembed")]
            EmbedderKind::Minilm => {
                println!("Loading MiniLM model (first run downloads ~90MB)...");
                Ok(Box::new(tinyrag_lib::embed::MiniLmEmbedder::new()?))
            }
            #[cfg(not(feature = "fastembed"))]
            EmbedderKind::Minilm => {
                bail!("the minilm embedder requires building with --features fastembed")
            }
        }
    }
}

fn document_id_for(input: &Path) -> String {
    input
        .file_name()
        .map_or_else(|| input.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No documents added yet");
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "Result {} (score: {:.4}, {}#{})",
            i + 1,
            result.score,
            result.chunk.document_id,
            result.chunk.sequence_index
        );
        println!("---");
        let preview: String = result.chunk.text.chars().take(300).collect();
        let ellipsis = if result.chunk.text.chars().count() > 300 { "..." } else { "" };
        println!("{preview}{ellipsis}\n");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;

    match &cli.command {
        Commands::Chunk { input } => {
            let text = fs::read_to_string(input)
                .with_context(|| format!("failed to read '{}'", input.display()))?;
            let chunker = config.chunker()?;
            let chunks = chunker.chunk(&text, &document_id_for(input));

            println!(
                "Chunked '{}' into {} chunks (max {}, overlap {}):\n",
                input.display(),
                chunks.len(),
                chunker.max_size(),
                chunker.overlap()
            );
            for chunk in &chunks {
                println!(
                    "--- Chunk {} ({} chars, offset {}) ---",
                    chunk.sequence_index + 1,
                    chunk.char_len(),
                    chunk.start_offset
                );
                println!("{}\n", chunk.text);
            }
        }

        Commands::Ingest { input, document_id } => {
            if config.storage_path.is_none() {
                bail!("ingest needs a storage path (--storage or storage_path in config)");
            }
            let text = fs::read_to_string(input)
                .with_context(|| format!("failed to read '{}'", input.display()))?;
            let document_id = document_id.clone().unwrap_or_else(|| document_id_for(input));

            let pipeline = RetrievalPipeline::from_config(&config, cli.build_embedder()?)?;
            if config.storage_path.as_deref().is_some_and(Path::exists) {
                pipeline.load()?;
            }

            let added = pipeline.ingest(&document_id, &text)?;
            pipeline.persist()?;
            info!(document_id = %document_id, added, total = pipeline.len(), "store persisted");

            println!("Added document: {document_id} ({added} chunks)");
        }

        Commands::Query { question, k } => {
            let Some(storage) = config.storage_path.as_deref() else {
                bail!("query needs a storage path (--storage or storage_path in config)");
            };

            let pipeline = RetrievalPipeline::from_config(&config, cli.build_embedder()?)?;
            if storage.exists() {
                pipeline.load()?;
            }

            let results = pipeline.answer(question, k.unwrap_or(config.top_k))?;
            print_results(&results);
        }

        Commands::Demo { input, query, k } => {
            println!("Loading '{}'...", input.display());
            let text = fs::read_to_string(input)
                .with_context(|| format!("failed to read '{}'", input.display()))?;

            let demo_config = PipelineConfig {
                storage_path: None,
                ..config.clone()
            };
            let pipeline = RetrievalPipeline::from_config(&demo_config, cli.build_embedder()?)?;

            let added = pipeline.ingest(&document_id_for(input), &text)?;
            println!("Indexed {added} chunks using {}", pipeline.embedder().model_name());

            let k = k.unwrap_or(config.top_k);
            println!("\nSearching: '{query}' (k={k})");
            println!("\n=== Results ===\n");
            print_results(&pipeline.answer(query, k)?);
        }
    }

    Ok(())
}

//! RAG (Retrieval-Augmented Generation) engine for docchat
//!
//! This crate provides the question answering engine, the vector store
//! backends, embedders, text splitting and documentation ingestion.

mod config;
mod context;
mod embedding;
mod engine;
mod loader;
mod qdrant;
mod splitter;
mod vector_store;


use std::path::Path;
use std::sync::Arc;

use tracing::info;

pub use config::{
    DEFAULT_COLLECTION_NAME, DEFAULT_QDRANT_URL, EmbeddingBackend, IndexingConfig, StoreBackend,
    StoreConfig,
};
pub use context::{
    CHUNK_SEPARATOR, NO_CONTEXT_SENTINEL, PROMPT_TEMPLATE, fill_template, format_context,
    relevance_scores, unique_sources,
};
pub use embedding::{HASH_EMBEDDING_DIMENSIONS, HashEmbedder, OpenAIEmbedder, cosine_similarity};
pub use engine::RagEngine;
pub use loader::{DocumentFormat, DocumentLoader, ExtractedText, html_to_text, markdown_to_text};
pub use qdrant::QdrantVectorStore;
pub use splitter::TextSplitter;
pub use vector_store::InMemoryVectorStore;

// Re-export core types for convenience
pub use docchat_core::{
    AskOptions, ChatResponse, CollectionInfo, ContextResult, Document, Embedder, Error, Result,
    ScoredChunk, VectorStore,
};

/// Build the embedder selected by configuration
pub fn build_embedder(config: &StoreConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedding {
        EmbeddingBackend::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                Error::Configuration("OpenAI embeddings require OPENAI_API_KEY".to_string())
            })?;
            let embedder =
                OpenAIEmbedder::new(api_key, &config.openai_base_url, &config.embedding_model)?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Hash => Ok(Arc::new(HashEmbedder::new())),
    }
}

/// Build the vector store selected by configuration. Not yet initialized.
pub fn build_vector_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let embedder = build_embedder(config)?;
    let splitter = TextSplitter::new(config.indexing);

    match config.backend {
        StoreBackend::Qdrant => {
            let store = QdrantVectorStore::new(
                &config.qdrant_url,
                config.qdrant_api_key.clone(),
                &config.collection_name,
                embedder,
                splitter,
            )?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new(
            &config.collection_name,
            embedder,
            splitter,
        ))),
    }
}

/// Load every supported file under `dir` into `store`.
/// Returns the number of documents and chunks written.
pub async fn ingest_directory(
    store: &dyn VectorStore,
    loader: &DocumentLoader,
    dir: &Path,
) -> Result<(usize, usize)> {
    let documents = loader.load_directory(dir)?;
    if documents.is_empty() {
        return Ok((0, 0));
    }

    let chunks = store.add_documents(&documents).await?;
    info!(dir = %dir.display(), documents = documents.len(), chunks, "directory ingested");
    Ok((documents.len(), chunks))
}

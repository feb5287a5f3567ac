//! Vector store implementations

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

use docchat_core::{
    CollectionInfo, Document, Embedder, Error, Result, ScoredChunk, VectorStore,
};

use crate::embedding::cosine_similarity;
use crate::splitter::TextSplitter;

/// A chunk ready to be written to a backend
#[derive(Debug, Clone)]
pub(crate) struct PreparedChunk {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// Split and embed documents, tagging every chunk with its parent's
/// metadata and a fresh `chunk_id`.
pub(crate) async fn prepare_chunks(
    documents: &[Document],
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
) -> Result<Vec<PreparedChunk>> {
    let mut prepared = Vec::new();

    for document in documents {
        if document.metadata.document_id.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "Document '{}' has no document_id",
                document.metadata.title
            )));
        }

        let texts = splitter.split(&document.content);
        if texts.is_empty() {
            debug!(document_id = %document.metadata.document_id, "document has no content, skipped");
            continue;
        }

        let embeddings = embedder.embed_documents(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let base = document.metadata_map();
        let total = texts.len();
        for (index, (content, embedding)) in texts.into_iter().zip(embeddings).enumerate() {
            let id = Uuid::new_v4().to_string();
            let mut metadata = base.clone();
            metadata.insert("chunk_id".to_string(), json!(id));
            metadata.insert("chunk_index".to_string(), json!(index));
            metadata.insert("total_chunks".to_string(), json!(total));
            prepared.push(PreparedChunk {
                id,
                content,
                metadata,
                embedding,
            });
        }
    }

    Ok(prepared)
}

/// Local in-memory vector store implementation
///
/// Scores are exact cosine similarities over every stored chunk. Ties keep
/// insertion order.
pub struct InMemoryVectorStore {
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    chunks: RwLock<Vec<PreparedChunk>>,
    initialized: AtomicBool,
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store
    pub fn new(
        collection_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        splitter: TextSplitter,
    ) -> Self {
        Self {
            collection_name: collection_name.into(),
            embedder,
            splitter,
            chunks: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Get the total number of stored chunks
    pub fn count(&self) -> Result<usize> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        Ok(chunks.len())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::VectorStore(format!(
                "Collection '{}' is not initialized",
                self.collection_name
            )))
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::Release);
        debug!(collection = %self.collection_name, "in-memory collection ready");
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        self.ensure_initialized()?;
        let prepared = prepare_chunks(documents, &self.splitter, self.embedder.as_ref()).await?;
        let count = prepared.len();

        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        chunks.extend(prepared);

        debug!(collection = %self.collection_name, count, "stored chunks");
        Ok(count)
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.ensure_initialized()?;
        if k == 0 || self.count()? == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let chunks = self
            .chunks
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        let mut results: Vec<ScoredChunk> = chunks
            .iter()
            .map(|chunk| ScoredChunk {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                score: cosine_similarity(&query_embedding, &chunk.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    fn collection_info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.collection_name.clone(),
            initialized: self.initialized.load(Ordering::Acquire),
            backend: "memory".to_string(),
        }
    }

    async fn delete_collection(&self) -> Result<()> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        chunks.clear();
        self.initialized.store(false, Ordering::Release);
        debug!(collection = %self.collection_name, "deleted in-memory collection");
        Ok(())
    }
}

//! Vector store trait

use async_trait::async_trait;

use crate::{CollectionInfo, Document, Result, ScoredChunk};

/// Trait for vector stores (e.g., Qdrant, in-memory)
///
/// An adapter owns one named collection. It splits and embeds documents on
/// the way in and returns scored chunks, best match first, on the way out.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Connect to the collection, creating it when missing. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Chunk, embed and store documents; returns the number of chunks stored
    async fn add_documents(&self, documents: &[Document]) -> Result<usize>;

    /// Up to `k` chunks ordered by descending relevance.
    ///
    /// An empty collection yields an empty vector, not an error.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Name and state of the collection
    fn collection_info(&self) -> CollectionInfo;

    /// Remove every stored chunk. A missing collection counts as success.
    async fn delete_collection(&self) -> Result<()>;
}

//! Embedding provider trait

use async_trait::async_trait;

use crate::{Error, Result};

/// Turns text into dense vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".to_string()))
    }

    /// Vector dimensionality
    fn dimensions(&self) -> usize;

    /// Short name used in logs and collection info
    fn name(&self) -> &str;
}

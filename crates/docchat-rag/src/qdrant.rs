//! Qdrant vector store backend.
//!
//! Each chunk is stored as one point whose payload is
//! `{"content": <text>, "metadata": {...}}`. Collections use cosine
//! distance, so Qdrant scores are similarities (higher is closer).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Number, Value, json};
use tracing::{debug, info};

use docchat_core::{
    CollectionInfo, Document, Embedder, Error, Result, ScoredChunk, VectorStore,
};

use crate::splitter::TextSplitter;
use crate::vector_store::prepare_chunks;

/// Points per upsert request
const UPSERT_BATCH_SIZE: usize = 256;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/) over gRPC.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    initialized: AtomicBool,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    ///
    /// No request is made until [`VectorStore::initialize`].
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        splitter: TextSplitter,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(map_err)?;
        Ok(Self::from_client(client, collection_name, embedder, splitter))
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(
        client: Qdrant,
        collection_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        splitter: TextSplitter,
    ) -> Self {
        Self {
            client,
            collection_name: collection_name.into(),
            embedder,
            splitter,
            initialized: AtomicBool::new(false),
        }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let collections = self.client.list_collections().await.map_err(map_err)?;
        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.collection_name))
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

fn map_err(e: qdrant_client::QdrantError) -> Error {
    Error::VectorStore(format!("qdrant: {}", e))
}

/// Convert a Qdrant payload value back into JSON
pub(crate) fn payload_value_to_json(value: &QdrantValue) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => json!(i),
        Some(Kind::DoubleValue(d)) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.iter().map(payload_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), payload_value_to_json(v)))
                .collect(),
        ),
    }
}

/// Rebuild a chunk from a point payload
pub(crate) fn chunk_from_payload(payload: &HashMap<String, QdrantValue>, score: f32) -> ScoredChunk {
    let content = match payload.get("content").map(payload_value_to_json) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let metadata = match payload.get("metadata").map(payload_value_to_json) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    ScoredChunk {
        content,
        metadata,
        score,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn initialize(&self) -> Result<()> {
        if self.collection_exists().await? {
            debug!(collection = %self.collection_name, "qdrant collection already exists");
        } else {
            let dimensions = self.embedder.dimensions() as u64;
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection_name)
                        .vectors_config(VectorParamsBuilder::new(dimensions, Distance::Cosine)),
                )
                .await
                .map_err(map_err)?;
            info!(collection = %self.collection_name, dimensions, "created qdrant collection");
        }

        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        self.ensure_initialized()?;
        let prepared = prepare_chunks(documents, &self.splitter, self.embedder.as_ref()).await?;
        if prepared.is_empty() {
            return Ok(0);
        }

        let mut points = Vec::with_capacity(prepared.len());
        for chunk in prepared {
            let payload = Payload::try_from(json!({
                "content": chunk.content,
                "metadata": Value::Object(chunk.metadata),
            }))
            .map_err(map_err)?;
            points.push(PointStruct::new(chunk.id, chunk.embedding, payload));
        }

        let count = points.len();
        for batch in points.chunks(UPSERT_BATCH_SIZE) {
            self.client
                .upsert_points(
                    UpsertPointsBuilder::new(&self.collection_name, batch.to_vec()).wait(true),
                )
                .await
                .map_err(map_err)?;
        }

        debug!(collection = %self.collection_name, count, "upserted chunks to qdrant");
        Ok(count)
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.ensure_initialized()?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_query(query).await?;
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection_name, embedding, k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(map_err)?;

        debug!(
            collection = %self.collection_name,
            results = response.result.len(),
            "qdrant search complete"
        );

        Ok(response
            .result
            .iter()
            .map(|point| chunk_from_payload(&point.payload, point.score))
            .collect())
    }

    fn collection_info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.collection_name.clone(),
            initialized: self.initialized.load(Ordering::Acquire),
            backend: "qdrant".to_string(),
        }
    }

    async fn delete_collection(&self) -> Result<()> {
        if self.collection_exists().await? {
            self.client
                .delete_collection(&self.collection_name)
                .await
                .map_err(map_err)?;
            info!(collection = %self.collection_name, "deleted qdrant collection");
        } else {
            debug!(collection = %self.collection_name, "qdrant collection absent, nothing to delete");
        }
        self.initialized.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexingConfig;
    use crate::embedding::HashEmbedder;

    #[test]
    fn test_payload_round_trip_through_qdrant_values() {
        let original = json!({
            "content": "Use NodeSDK to start tracing.",
            "metadata": {
                "source": "otel-docs",
                "chunk_index": 0,
                "weight": 0.5,
                "tags": ["node", "tracing"],
                "draft": false,
                "missing": null
            }
        });
        let payload = Payload::try_from(original.clone()).unwrap();
        let map: HashMap<String, QdrantValue> = payload.into();

        let chunk = chunk_from_payload(&map, 0.87);
        assert_eq!(chunk.content, "Use NodeSDK to start tracing.");
        assert_eq!(chunk.source(), "otel-docs");
        assert_eq!(Value::Object(chunk.metadata), original["metadata"]);
        assert_eq!(chunk.score, 0.87);
    }

    #[test]
    fn test_missing_payload_fields() {
        let chunk = chunk_from_payload(&HashMap::new(), 0.1);
        assert!(chunk.content.is_empty());
        assert_eq!(chunk.source(), "unknown");
    }

    #[test]
    fn test_new_store_is_not_initialized() {
        let store = QdrantVectorStore::new(
            "http://localhost:6334",
            None,
            "documentation",
            Arc::new(HashEmbedder::new()),
            TextSplitter::new(IndexingConfig::default()),
        )
        .unwrap();

        assert_eq!(
            store.collection_info(),
            CollectionInfo {
                name: "documentation".to_string(),
                initialized: false,
                backend: "qdrant".to_string(),
            }
        );
    }
}

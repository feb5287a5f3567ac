//! Vector store, embedding and chunking configuration

use serde::{Deserialize, Serialize};

use docchat_core::env::{parse_or, process_env, read, read_or};
use docchat_core::{Error, Result};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION_NAME: &str = "documentation";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Which vector store backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Qdrant,
    Memory,
}

/// Which embedder to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    Hash,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl IndexingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("CHUNK_SIZE must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

/// Everything needed to build the vector store adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection_name: String,
    pub embedding: EmbeddingBackend,
    pub embedding_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub indexing: IndexingConfig,
}

impl StoreConfig {
    /// Fail for a command whose writes or reads must outlive this process.
    /// The memory backend starts empty every run.
    pub fn require_persistent(&self, command: &str) -> Result<()> {
        match self.backend {
            StoreBackend::Qdrant => Ok(()),
            StoreBackend::Memory => Err(Error::Configuration(format!(
                "'{}' needs a persistent vector store but VECTOR_STORE=memory only lives \
                 for one process; use VECTOR_STORE=qdrant, or pass --docs <dir> to \
                 serve, ask or context",
                command
            ))),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(process_env)
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match read_or(&lookup, "VECTOR_STORE", "qdrant").to_lowercase().as_str() {
            "qdrant" => StoreBackend::Qdrant,
            "memory" | "in-memory" => StoreBackend::Memory,
            other => {
                return Err(Error::Configuration(format!(
                    "Unknown VECTOR_STORE '{}'. Expected qdrant or memory",
                    other
                )));
            }
        };

        let qdrant_url = read_or(&lookup, "QDRANT_URL", DEFAULT_QDRANT_URL);
        url::Url::parse(&qdrant_url).map_err(|e| {
            Error::Configuration(format!("Invalid QDRANT_URL '{}': {}", qdrant_url, e))
        })?;

        let openai_api_key = read(&lookup, "OPENAI_API_KEY");
        let embedding = match read(&lookup, "EMBEDDING_PROVIDER").map(|v| v.to_lowercase()) {
            Some(ref v) if v == "openai" => {
                if openai_api_key.is_none() {
                    return Err(Error::Configuration(
                        "EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY".to_string(),
                    ));
                }
                EmbeddingBackend::OpenAI
            }
            Some(ref v) if v == "hash" => EmbeddingBackend::Hash,
            Some(other) => {
                return Err(Error::Configuration(format!(
                    "Unknown EMBEDDING_PROVIDER '{}'. Expected openai or hash",
                    other
                )));
            }
            None if openai_api_key.is_some() => EmbeddingBackend::OpenAI,
            None => EmbeddingBackend::Hash,
        };

        let defaults = IndexingConfig::default();
        let indexing = IndexingConfig::new(
            parse_or(&lookup, "CHUNK_SIZE", defaults.chunk_size)?,
            parse_or(&lookup, "CHUNK_OVERLAP", defaults.chunk_overlap)?,
        )?;

        Ok(Self {
            backend,
            qdrant_url,
            qdrant_api_key: read(&lookup, "QDRANT_API_KEY"),
            collection_name: read_or(&lookup, "COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
            embedding,
            embedding_model: read_or(&lookup, "EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            openai_api_key,
            openai_base_url: read_or(&lookup, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            indexing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StoreConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.backend, StoreBackend::Qdrant);
        assert_eq!(config.qdrant_url, DEFAULT_QDRANT_URL);
        assert_eq!(config.collection_name, "documentation");
        assert_eq!(config.embedding, EmbeddingBackend::Hash);
        assert_eq!(config.indexing, IndexingConfig::default());
    }

    #[test]
    fn test_openai_embeddings_selected_when_key_present() {
        let config = config_from(&[("OPENAI_API_KEY", "sk"), ("VECTOR_STORE", "memory")]).unwrap();
        assert_eq!(config.embedding, EmbeddingBackend::OpenAI);
        assert_eq!(config.backend, StoreBackend::Memory);

        let config = config_from(&[("OPENAI_API_KEY", "sk"), ("EMBEDDING_PROVIDER", "hash")]).unwrap();
        assert_eq!(config.embedding, EmbeddingBackend::Hash);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(config_from(&[("VECTOR_STORE", "chroma")]).is_err());
        assert!(config_from(&[("EMBEDDING_PROVIDER", "openai")]).is_err());
        assert!(config_from(&[("QDRANT_URL", "::not a url")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "100"), ("CHUNK_OVERLAP", "100")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "0")]).is_err());
    }

    #[test]
    fn test_memory_backend_is_not_persistent() {
        let memory = config_from(&[("VECTOR_STORE", "memory")]).unwrap();
        for command in ["ingest", "reset", "info"] {
            match memory.require_persistent(command) {
                Err(Error::Configuration(msg)) => {
                    assert!(msg.contains(command));
                    assert!(msg.contains("--docs"));
                }
                other => panic!("expected configuration error, got {other:?}"),
            }
        }

        let qdrant = config_from(&[]).unwrap();
        assert!(qdrant.require_persistent("ingest").is_ok());
    }
}

//! Common types used across the docchat system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::llm::ProviderKind;

/// Label used when a chunk carries no `source` metadata
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Metadata keys owned by the typed fields of [`DocumentMetadata`]
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["document_id", "title", "source", "ingestedAt"];

/// Default number of chunks retrieved per question
pub const DEFAULT_MAX_CONTEXT_DOCS: usize = 5;

/// Metadata attached to every ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub title: String,
    pub source: String,
    #[serde(rename = "ingestedAt")]
    pub ingested_at: DateTime<Utc>,
    /// Additional scalar metadata copied onto every chunk
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A unit of knowledge base content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(
        document_id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: DocumentMetadata {
                document_id: document_id.into(),
                title: title.into(),
                source: source.into(),
                ingested_at: Utc::now(),
                extra: BTreeMap::new(),
            },
        }
    }

    /// Attach an extra metadata entry. Reserved keys are ignored; set the
    /// typed fields instead.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !RESERVED_METADATA_KEYS.contains(&key.as_str()) {
            self.metadata.extra.insert(key, value.into());
        }
        self
    }

    /// Metadata as a flat JSON object, the shape stored on each chunk.
    /// Typed fields override extra entries of the same name.
    pub fn metadata_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .metadata
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert("document_id".to_string(), Value::from(self.metadata.document_id.as_str()));
        map.insert("title".to_string(), Value::from(self.metadata.title.as_str()));
        map.insert("source".to_string(), Value::from(self.metadata.source.as_str()));
        if let Ok(ingested_at) = serde_json::to_value(self.metadata.ingested_at) {
            map.insert("ingestedAt".to_string(), ingested_at);
        }
        map
    }
}

/// A stored chunk paired with its relevance score.
///
/// Scores are cosine similarities: higher means a closer match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

impl ScoredChunk {
    /// The chunk's `source` label, or `"unknown"` when absent
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_SOURCE)
    }
}

/// Identity and state of the backing collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub name: String,
    pub initialized: bool,
    pub backend: String,
}

/// Per-request options for question answering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOptions {
    pub provider: Option<ProviderKind>,
    pub max_context_docs: usize,
    pub include_context: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            provider: None,
            max_context_docs: DEFAULT_MAX_CONTEXT_DOCS,
            include_context: false,
        }
    }
}

/// Source and score of one retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub provider: ProviderKind,
    pub timestamp: DateTime<Utc>,
}

/// Retrieval details returned only when a caller asks for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDetails {
    pub context: String,
    pub relevance_scores: Vec<RelevanceScore>,
    pub documents_used: usize,
}

/// Answer to a question, grounded in retrieved documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<String>,
    pub metadata: ResponseMetadata,
    #[serde(flatten)]
    pub details: Option<ContextDetails>,
}

/// Retrieval-only result, no generation involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    pub context: String,
    pub sources: Vec<String>,
    pub document_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_metadata_map_is_flat() {
        let doc = Document::new("doc-1", "Tracing", "otel-docs", "Use NodeSDK")
            .with_metadata("section", "getting-started");
        let map = doc.metadata_map();

        assert_eq!(map["document_id"], "doc-1");
        assert_eq!(map["title"], "Tracing");
        assert_eq!(map["source"], "otel-docs");
        assert_eq!(map["section"], "getting-started");
        assert!(map.contains_key("ingestedAt"));
    }

    #[test]
    fn test_reserved_metadata_keys_cannot_shadow_typed_fields() {
        let doc = Document::new("doc-1", "Tracing", "otel-docs", "Use NodeSDK")
            .with_metadata("source", 42)
            .with_metadata("title", "Other");
        assert!(doc.metadata.extra.is_empty());

        let mut doc = doc;
        doc.metadata.extra.insert("document_id".to_string(), json!("forged"));
        doc.metadata.extra.insert("source".to_string(), json!(42));
        let map = doc.metadata_map();
        assert_eq!(map["source"], "otel-docs");
        assert_eq!(map["document_id"], "doc-1");
        assert_eq!(map["title"], "Tracing");

        let chunk = ScoredChunk {
            content: doc.content.clone(),
            metadata: map,
            score: 0.9,
        };
        assert_eq!(chunk.source(), "otel-docs");
    }

    #[test]
    fn test_scored_chunk_source_defaults_to_unknown() {
        let chunk = ScoredChunk {
            content: "text".to_string(),
            metadata: Map::new(),
            score: 0.5,
        };
        assert_eq!(chunk.source(), "unknown");

        let mut metadata = Map::new();
        metadata.insert("source".to_string(), json!(42));
        let chunk = ScoredChunk { metadata, ..chunk };
        assert_eq!(chunk.source(), "unknown");
    }

    #[test]
    fn test_chat_response_without_details_omits_context_fields() {
        let response = ChatResponse {
            response: "answer".to_string(),
            sources: vec!["otel-docs".to_string()],
            metadata: ResponseMetadata {
                provider: ProviderKind::OpenAI,
                timestamp: Utc::now(),
            },
            details: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("context").is_none());
        assert!(value.get("relevanceScores").is_none());
        assert!(value.get("documentsUsed").is_none());
        assert_eq!(value["metadata"]["provider"], "openai");
    }

    #[test]
    fn test_chat_response_with_details_flattens_fields() {
        let response = ChatResponse {
            response: "answer".to_string(),
            sources: vec!["otel-docs".to_string()],
            metadata: ResponseMetadata {
                provider: ProviderKind::Anthropic,
                timestamp: Utc::now(),
            },
            details: Some(ContextDetails {
                context: "ctx".to_string(),
                relevance_scores: vec![RelevanceScore {
                    source: "otel-docs".to_string(),
                    score: 0.5,
                }],
                documents_used: 1,
            }),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["context"], "ctx");
        assert_eq!(value["documentsUsed"], 1);
        assert_eq!(value["relevanceScores"][0]["source"], "otel-docs");
    }

    #[test]
    fn test_context_result_uses_camel_case() {
        let result = ContextResult {
            context: "ctx".to_string(),
            sources: vec![],
            document_count: 0,
        };
        insta::assert_json_snapshot!(result, @r###"
        {
          "context": "ctx",
          "sources": [],
          "documentCount": 0
        }
        "###);
    }
}

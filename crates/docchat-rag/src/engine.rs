//! RAG engine implementation

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use docchat_core::{
    AskOptions, ChatMessage, ChatResponse, CollectionInfo, ContextDetails, ContextResult,
    Document, Error, ProviderKind, ProviderRegistry, ProviderTestResult, ResponseMetadata, Result,
    ScoredChunk, VectorStore,
};

use crate::context::{fill_template, format_context, relevance_scores, unique_sources};

/// Retrieval-augmented question answering over one collection
///
/// Retrieval, context formatting, prompt filling and generation run strictly
/// in sequence. Failures are logged and returned; nothing is retried.
pub struct RagEngine {
    store: Arc<dyn VectorStore>,
    providers: Arc<ProviderRegistry>,
}

impl RagEngine {
    pub fn new(store: Arc<dyn VectorStore>, providers: Arc<ProviderRegistry>) -> Self {
        Self { store, providers }
    }

    /// Connect the underlying store
    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await?;
        info!(collection = %self.store.collection_info().name, "RAG engine initialized");
        Ok(())
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.store
            .similarity_search_with_score(question, k)
            .await
            .map_err(|e| {
                error!(error = %e, "similarity search failed");
                Error::Retrieval(format!("Failed to retrieve context for question: {}", e))
            })
    }

    /// Answer a question from retrieved documentation
    pub async fn ask_question(&self, question: &str, options: AskOptions) -> Result<ChatResponse> {
        info!(
            provider = ?options.provider,
            max_context_docs = options.max_context_docs,
            "processing question"
        );

        let chunks = self.retrieve(question, options.max_context_docs).await?;
        let context = format_context(&chunks);

        let provider = self.providers.get_provider(options.provider)?;
        let prompt = fill_template(&context, question);
        let generation = provider
            .generate(&[ChatMessage::user(prompt)])
            .await
            .inspect_err(|e| error!(provider = %provider.kind(), error = %e, "generation failed"))?;

        let details = options.include_context.then(|| ContextDetails {
            context,
            relevance_scores: relevance_scores(&chunks),
            documents_used: chunks.len(),
        });

        info!(
            provider = %provider.kind(),
            documents = chunks.len(),
            "question answered"
        );

        Ok(ChatResponse {
            response: generation.text,
            sources: unique_sources(&chunks),
            metadata: ResponseMetadata {
                provider: provider.kind(),
                timestamp: Utc::now(),
            },
            details,
        })
    }

    /// Retrieval and formatting only, without calling a provider
    pub async fn get_context_for_question(
        &self,
        question: &str,
        max_docs: usize,
    ) -> Result<ContextResult> {
        let chunks = self.retrieve(question, max_docs).await?;
        Ok(ContextResult {
            context: format_context(&chunks),
            sources: unique_sources(&chunks),
            document_count: chunks.len(),
        })
    }

    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers.available_providers()
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.providers.default_provider()
    }

    pub async fn test_provider(&self, name: &str) -> ProviderTestResult {
        self.providers.test_provider(name).await
    }

    pub async fn test_all_providers(&self) -> Vec<ProviderTestResult> {
        self.providers.test_all_providers().await
    }

    /// Store documents; returns the number of chunks written
    pub async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let count = self.store.add_documents(documents).await?;
        info!(documents = documents.len(), chunks = count, "documents added");
        Ok(count)
    }

    pub fn collection_info(&self) -> CollectionInfo {
        self.store.collection_info()
    }

    pub async fn delete_collection(&self) -> Result<()> {
        self.store.delete_collection().await
    }
}

//! Context formatting and prompt assembly

use std::collections::HashSet;

use docchat_core::{RelevanceScore, ScoredChunk};

/// Substituted for the context when retrieval finds nothing
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found in the knowledge base.";

/// Separator placed between formatted chunks
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Prompt sent to the provider; `{context}` and `{question}` are filled per request
pub const PROMPT_TEMPLATE: &str = "You are a helpful documentation assistant. \
Answer the user's question using only the context below. \
If the context does not contain the answer, say that you don't know instead of guessing. \
Mention the relevant source when it helps the user.

Context:
{context}

Question: {question}

Answer:";

/// Render chunks in result order, each under a source and relevance header
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    chunks
        .iter()
        .map(|chunk| {
            format!(
                "[Source: {}, Relevance: {:.3}]\n{}",
                chunk.source(),
                chunk.score,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// Distinct sources in first-seen order
pub fn unique_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .map(ScoredChunk::source)
        .filter(|source| seen.insert(*source))
        .map(str::to_string)
        .collect()
}

pub fn relevance_scores(chunks: &[ScoredChunk]) -> Vec<RelevanceScore> {
    chunks
        .iter()
        .map(|chunk| RelevanceScore {
            source: chunk.source().to_string(),
            score: chunk.score,
        })
        .collect()
}

/// Fill [`PROMPT_TEMPLATE`]
pub fn fill_template(context: &str, question: &str) -> String {
    // Question first so braces inside retrieved text are never re-expanded
    PROMPT_TEMPLATE
        .replacen("{question}", question, 1)
        .replacen("{context}", context, 1)
}

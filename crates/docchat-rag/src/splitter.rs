//! Fixed-size text splitting with overlap

use crate::config::IndexingConfig;

/// Splits text into overlapping windows of `chunk_size` characters.
///
/// Consecutive windows share `chunk_overlap` characters. Whitespace-only
/// windows are dropped.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    config: IndexingConfig,
}

impl TextSplitter {
    pub fn new(config: IndexingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> IndexingConfig {
        self.config
    }

    /// Chunk a document into smaller pieces
    pub fn split(&self, content: &str) -> Vec<String> {
        let chars: Vec<char> = content.trim().chars().collect();
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.config.chunk_size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }

            if end >= chars.len() {
                break;
            }

            start += step;
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(IndexingConfig::default())
    }
}

//! Core traits and types for docchat
//!
//! This crate defines the fundamental traits and types used across the docchat system.
//! It provides capability-facing interfaces for LLM providers, vector stores and
//! embedders, plus the provider registry, making the system test-friendly and extensible.

pub mod embedding;
pub mod env;
pub mod error;
pub mod llm;
pub mod registry;
pub mod types;
pub mod vector_store;

pub use embedding::Embedder;
pub use error::{Error, Result};
pub use llm::{
    ChatMessage, GenerationConfig, GenerationResult, LLMProvider, ProviderKind,
    ProviderTestResult, Role,
};
pub use registry::{ProviderRegistry, SMOKE_TEST_MESSAGE};
pub use types::*;
pub use vector_store::VectorStore;

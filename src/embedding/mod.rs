//! Text-to-vector embedding seam.
//!
//! Provides the [`EmbeddingProvider`] trait and a self-contained hashed
//! bag-of-words implementation. The provider is created via
//! [`create_provider`] from configuration; swapping in a model-backed
//! provider is a matter of adding a factory arm.

pub mod hashed;

use anyhow::Result;

/// Number of dimensions in the embedding vectors.
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`]
/// dimensions. All methods are synchronous — callers in async contexts should
/// use `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"hashed"` is supported (deterministic feature hashing,
/// no model files needed).
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hashed" => Ok(Box::new(hashed::HashedEmbedding::new())),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: hashed"),
    }
}

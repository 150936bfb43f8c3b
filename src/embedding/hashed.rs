//! Hashed bag-of-words embedding provider.
//!
//! Feature hashing over lowercased word tokens: each token hashes to one
//! dimension with a hash-derived sign, counts accumulate, and the final
//! vector is L2-normalized. Texts sharing vocabulary land near each other
//! under cosine similarity; the mapping is fully deterministic, so vectors
//! written to the index stay valid across restarts and machines.

use anyhow::Result;

use super::{EmbeddingProvider, EMBEDDING_DIM};

/// Deterministic feature-hashing embedder. Stateless and cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct HashedEmbedding;

impl HashedEmbedding {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingProvider for HashedEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];

        for token in tokenize(text) {
            let h = fnv1a(token.as_bytes());
            let idx = (h % EMBEDDING_DIM as u64) as usize;
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }

        l2_normalize(&mut v);
        Ok(v)
    }
}

/// Lowercased alphanumeric word tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// FNV-1a 64-bit. Stable across processes and platforms, unlike the std
/// `DefaultHasher`, which carries no cross-version guarantee.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn embedding_is_deterministic_and_normalized() {
        let provider = HashedEmbedding::new();
        let a = provider.embed("Paris is the capital of France").unwrap();
        let b = provider.embed("Paris is the capital of France").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_vocabulary_scores_higher_than_disjoint() {
        let provider = HashedEmbedding::new();
        let doc = provider.embed("Paris is the capital of France").unwrap();
        let close = provider.embed("capital of France").unwrap();
        let far = provider.embed("quantum entanglement qubits").unwrap();

        assert!(cosine(&doc, &close) > cosine(&doc, &far));
        assert!(cosine(&doc, &close) > 0.0);
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let provider = HashedEmbedding::new();
        let v = provider.embed("").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn tokenization_ignores_case_and_punctuation() {
        let provider = HashedEmbedding::new();
        let a = provider.embed("Hello, World!").unwrap();
        let b = provider.embed("hello world").unwrap();
        assert_eq!(a, b);
    }
}

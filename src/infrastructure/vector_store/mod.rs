pub mod in_memory_index;
pub mod pgvector_index;
pub mod qdrant_index;

pub use in_memory_index::InMemoryVectorIndex;
pub use pgvector_index::PgVectorIndex;
pub use qdrant_index::{QdrantConfig, QdrantVectorIndex};

/// Cosine similarity in [-1, 1]; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

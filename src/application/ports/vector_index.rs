use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::errors::RagError;

#[derive(Debug)]
pub enum VectorIndexError {
    ConnectionError(String),
    CollectionNotFound(String),
    DimensionMismatch { expected: usize, actual: usize },
    InvalidInput(String),
    BackendError(String),
}

impl std::fmt::Display for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            VectorIndexError::CollectionNotFound(name) => {
                write!(f, "Collection not found: {}", name)
            }
            VectorIndexError::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: collection expects {}, got {}",
                expected, actual
            ),
            VectorIndexError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            VectorIndexError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for VectorIndexError {}

impl From<VectorIndexError> for RagError {
    fn from(error: VectorIndexError) -> Self {
        match error {
            VectorIndexError::ConnectionError(_) => RagError::TransientExternal(error.to_string()),
            VectorIndexError::InvalidInput(msg) => RagError::InvalidInput(msg),
            VectorIndexError::CollectionNotFound(_)
            | VectorIndexError::DimensionMismatch { .. }
            | VectorIndexError::BackendError(_) => RagError::PermanentExternal(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    Cosine,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "Cosine",
        }
    }
}

/// Payload stored alongside every vector point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub context_item_id: i64,
    pub context_id: i64,
    pub context_type: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    /// Equal to the ContextItem id.
    pub id: i64,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub score: f32,
    pub payload: PointPayload,
    /// Filled in by the reranker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl SearchHit {
    /// The score shown to users: the rerank score when present.
    pub fn effective_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.score)
    }
}

/// Search result ordering: score descending, then id ascending.
pub fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the collection if it is missing. An existing collection with a
    /// different dimension is an error; it is never converted.
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError>;

    /// Drops and recreates the collection. Destructive.
    async fn recreate_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError>;

    /// Dimension of an existing collection, `None` when it does not exist.
    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, VectorIndexError>;

    /// Replaces any point with the same id. Returns an opaque operation id.
    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<String, VectorIndexError>;

    /// Removes every point whose payload `context_id` matches.
    async fn delete_by_context(&self, collection: &str, context_id: i64)
    -> Result<(), VectorIndexError>;

    /// Nearest points whose payload `context_id` is in `context_ids`, ordered
    /// by score descending then id ascending.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        context_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError>;
}

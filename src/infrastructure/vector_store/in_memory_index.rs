use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::application::ports::VectorIndex;
use crate::application::ports::vector_index::{
    DistanceMetric, SearchHit, VectorIndexError, VectorPoint, compare_hits,
};
use crate::infrastructure::vector_store::cosine_similarity;

struct Collection {
    dimension: usize,
    points: BTreeMap<i64, VectorPoint>,
}

/// Exact cosine search over points held in memory.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an empty collection already in place.
    pub fn with_collection(self, name: &str, dimension: usize) -> Self {
        self.write().insert(
            name.to_string(),
            Collection {
                dimension,
                points: BTreeMap::new(),
            },
        );
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Collection>> {
        self.collections.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Collection>> {
        self.collections.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Points of a collection in id order.
    pub fn points(&self, collection: &str) -> Vec<VectorPoint> {
        self.read()
            .get(collection)
            .map(|c| c.points.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn point_count(&self, collection: &str) -> usize {
        self.read()
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        _metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        let mut collections = self.write();
        match collections.get(name) {
            Some(existing) if existing.dimension != dimension => {
                Err(VectorIndexError::DimensionMismatch {
                    expected: existing.dimension,
                    actual: dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                collections.insert(
                    name.to_string(),
                    Collection {
                        dimension,
                        points: BTreeMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn recreate_collection(
        &self,
        name: &str,
        dimension: usize,
        _metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        self.write().insert(
            name.to_string(),
            Collection {
                dimension,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, VectorIndexError> {
        Ok(self.read().get(name).map(|c| c.dimension))
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<String, VectorIndexError> {
        if point.vector.is_empty() {
            return Err(VectorIndexError::InvalidInput("Empty vector".to_string()));
        }

        let mut collections = self.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorIndexError::CollectionNotFound(collection.to_string()))?;

        if point.vector.len() != target.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: target.dimension,
                actual: point.vector.len(),
            });
        }

        target.points.insert(point.id, point);
        Ok(Uuid::new_v4().to_string())
    }

    async fn delete_by_context(
        &self,
        collection: &str,
        context_id: i64,
    ) -> Result<(), VectorIndexError> {
        if let Some(target) = self.write().get_mut(collection) {
            target
                .points
                .retain(|_, point| point.payload.context_id != context_id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        context_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        if query_vector.is_empty() {
            return Err(VectorIndexError::InvalidInput("Empty query vector".to_string()));
        }

        let collections = self.read();
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorIndexError::CollectionNotFound(collection.to_string()))?;

        if query_vector.len() != target.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: target.dimension,
                actual: query_vector.len(),
            });
        }

        let mut hits: Vec<SearchHit> = target
            .points
            .values()
            .filter(|point| context_ids.contains(&point.payload.context_id))
            .map(|point| SearchHit {
                id: point.id,
                score: cosine_similarity(query_vector, &point.vector),
                payload: point.payload.clone(),
                rerank_score: None,
            })
            .collect();

        hits.sort_by(compare_hits);
        hits.truncate(limit);
        Ok(hits)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use pgvector::{Vector, VectorExpressionMethods};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::application::ports::VectorIndex;
use crate::application::ports::vector_index::{
    DistanceMetric, PointPayload, SearchHit, VectorIndexError, VectorPoint, compare_hits,
};
use crate::infrastructure::database::models::{NewEmbeddingPointModel, NewVectorCollectionModel};
use crate::infrastructure::database::schema::{embedding_points, vector_collections};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

/// Vector index stored in PostgreSQL through pgvector. Each collection's
/// dimension is recorded in `vector_collections` and enforced on write.
pub struct PgVectorIndex {
    pool: DbPool,
}

fn backend_error(error: diesel::result::Error) -> VectorIndexError {
    VectorIndexError::BackendError(error.to_string())
}

fn load_dimension(conn: &mut PgConnection, name: &str) -> Result<Option<usize>, VectorIndexError> {
    let dimension: Option<i32> = vector_collections::table
        .find(name)
        .select(vector_collections::dimension)
        .first(conn)
        .optional()
        .map_err(backend_error)?;
    Ok(dimension.map(|d| d as usize))
}

impl PgVectorIndex {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, VectorIndexError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, VectorIndexError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection_from_pool(&pool)
                .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;
            work(&mut conn)
        })
        .await
        .map_err(|e| VectorIndexError::BackendError(format!("Blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        let name = name.to_string();
        self.blocking(move |conn| match load_dimension(conn, &name)? {
            Some(existing) if existing != dimension => Err(VectorIndexError::DimensionMismatch {
                expected: existing,
                actual: dimension,
            }),
            Some(_) => Ok(()),
            None => {
                diesel::insert_into(vector_collections::table)
                    .values(&NewVectorCollectionModel {
                        name,
                        dimension: dimension as i32,
                        metric: metric.as_str().to_string(),
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .map_err(backend_error)?;
                Ok(())
            }
        })
        .await
    }

    async fn recreate_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        let name = name.to_string();
        self.blocking(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                // Points go with the collection row (ON DELETE CASCADE).
                diesel::delete(vector_collections::table.find(&name)).execute(conn)?;
                diesel::insert_into(vector_collections::table)
                    .values(&NewVectorCollectionModel {
                        name: name.clone(),
                        dimension: dimension as i32,
                        metric: metric.as_str().to_string(),
                    })
                    .execute(conn)?;
                Ok(())
            })
            .map_err(backend_error)
        })
        .await
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, VectorIndexError> {
        let name = name.to_string();
        self.blocking(move |conn| load_dimension(conn, &name)).await
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<String, VectorIndexError> {
        if point.vector.is_empty() {
            return Err(VectorIndexError::InvalidInput("Empty vector".to_string()));
        }

        let collection = collection.to_string();
        self.blocking(move |conn| {
            let dimension = load_dimension(conn, &collection)?
                .ok_or_else(|| VectorIndexError::CollectionNotFound(collection.clone()))?;
            if point.vector.len() != dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: dimension,
                    actual: point.vector.len(),
                });
            }

            let payload = serde_json::to_value(&point.payload)
                .map_err(|e| VectorIndexError::InvalidInput(e.to_string()))?;
            let row = NewEmbeddingPointModel {
                collection,
                point_id: point.id,
                context_id: point.payload.context_id,
                embedding: Vector::from(point.vector),
                payload,
                updated_at: Utc::now(),
            };

            diesel::insert_into(embedding_points::table)
                .values(&row)
                .on_conflict((embedding_points::collection, embedding_points::point_id))
                .do_update()
                .set((
                    embedding_points::context_id.eq(excluded(embedding_points::context_id)),
                    embedding_points::embedding.eq(excluded(embedding_points::embedding)),
                    embedding_points::payload.eq(excluded(embedding_points::payload)),
                    embedding_points::updated_at.eq(excluded(embedding_points::updated_at)),
                ))
                .execute(conn)
                .map_err(backend_error)?;

            Ok(Uuid::new_v4().to_string())
        })
        .await
    }

    async fn delete_by_context(
        &self,
        collection: &str,
        context_id: i64,
    ) -> Result<(), VectorIndexError> {
        let collection = collection.to_string();
        self.blocking(move |conn| {
            diesel::delete(
                embedding_points::table
                    .filter(embedding_points::collection.eq(&collection))
                    .filter(embedding_points::context_id.eq(context_id)),
            )
            .execute(conn)
            .map_err(backend_error)?;
            Ok(())
        })
        .await
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
        if context_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let collection = collection.to_string();
        let query = query_vector.to_vec();
        let filter: Vec<i64> = context_ids.iter().copied().collect();

        let rows: Vec<(i64, serde_json::Value, f64)> = self
            .blocking(move |conn| {
                let dimension = load_dimension(conn, &collection)?
                    .ok_or_else(|| VectorIndexError::CollectionNotFound(collection.clone()))?;
                if query.len() != dimension {
                    return Err(VectorIndexError::DimensionMismatch {
                        expected: dimension,
                        actual: query.len(),
                    });
                }

                let query = Vector::from(query);
                let distance = || embedding_points::embedding.cosine_distance(query.clone());
                embedding_points::table
                    .filter(embedding_points::collection.eq(&collection))
                    .filter(embedding_points::context_id.eq_any(filter))
                    .select((
                        embedding_points::point_id,
                        embedding_points::payload,
                        distance(),
                    ))
                    .order((distance().asc(), embedding_points::point_id.asc()))
                    .limit(limit as i64)
                    .load(conn)
                    .map_err(backend_error)
            })
            .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for (id, payload, distance) in rows {
            let payload: PointPayload = serde_json::from_value(payload)
                .map_err(|e| VectorIndexError::BackendError(format!("Bad payload for {}: {}", id, e)))?;
            if !context_ids.contains(&payload.context_id) {
                continue;
            }
            hits.push(SearchHit {
                id,
                score: (1.0 - distance) as f32,
                payload,
                rerank_score: None,
            });
        }

        hits.sort_by(compare_hits);
        Ok(hits)
    }
}

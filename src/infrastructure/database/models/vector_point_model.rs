use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;

use crate::infrastructure::database::schema::{embedding_points, vector_collections};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vector_collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VectorCollectionModel {
    pub name: String,
    pub dimension: i32,
    pub metric: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewVectorCollectionModel {
    pub name: String,
    pub dimension: i32,
    pub metric: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = embedding_points)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewEmbeddingPointModel {
    pub collection: String,
    pub point_id: i64,
    pub context_id: i64,
    pub embedding: Vector,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

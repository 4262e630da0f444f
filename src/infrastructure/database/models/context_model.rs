use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::Context;
use crate::domain::value_objects::{ContextKind, ProcessingStatus};
use crate::infrastructure::database::schema::context;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = context)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContextModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub original_content: Option<String>,
    pub chunk_count: i32,
    pub processing_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns the ingestion pipeline writes back.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = context)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContextChangeset {
    pub original_content: Option<String>,
    pub chunk_count: i32,
    pub processing_status: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Context> for ContextChangeset {
    fn from(context: &Context) -> Self {
        Self {
            original_content: context.original_content().map(str::to_string),
            chunk_count: context.chunk_count(),
            processing_status: context.processing_status().as_str().to_string(),
            updated_at: context.updated_at(),
        }
    }
}

impl TryFrom<ContextModel> for Context {
    type Error = String;

    fn try_from(model: ContextModel) -> Result<Self, Self::Error> {
        let kind = ContextKind::from_string(&model.kind)?;
        let status = ProcessingStatus::from_string(&model.processing_status)?;

        Ok(Context::from_database(
            model.id,
            model.name,
            model.description,
            kind,
            model.original_content,
            model.chunk_count,
            status,
            model.created_at,
            model.updated_at,
        ))
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::{ContextItem, NewContextItem};
use crate::infrastructure::database::schema::contextitem;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = contextitem)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContextItemModel {
    pub id: i64,
    pub context_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
    pub metadata: serde_json::Value,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contextitem)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewContextItemModel {
    pub context_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
    pub metadata: serde_json::Value,
    pub file_path: Option<String>,
}

impl From<&NewContextItem> for NewContextItemModel {
    fn from(item: &NewContextItem) -> Self {
        Self {
            context_id: item.context_id,
            title: item.title.clone(),
            content: item.content.clone(),
            order_index: item.order_index,
            metadata: item.metadata.clone(),
            file_path: item.file_path.clone(),
        }
    }
}

impl From<ContextItemModel> for ContextItem {
    fn from(model: ContextItemModel) -> Self {
        ContextItem::from_database(
            model.id,
            model.context_id,
            model.title,
            model.content,
            model.order_index,
            model.metadata,
            model.file_path,
            model.created_at,
            model.updated_at,
        )
    }
}

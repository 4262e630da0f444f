use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A retrievable chunk of a context. Its id doubles as the vector point id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    id: i64,
    context_id: i64,
    title: String,
    content: String,
    order_index: Option<i32>,
    metadata: serde_json::Value,
    file_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A chunk that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContextItem {
    pub context_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
    pub metadata: serde_json::Value,
    pub file_path: Option<String>,
}

impl ContextItem {
    pub fn from_database(
        id: i64,
        context_id: i64,
        title: String,
        content: String,
        order_index: Option<i32>,
        metadata: serde_json::Value,
        file_path: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            context_id,
            title,
            content,
            order_index,
            metadata,
            file_path,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn context_id(&self) -> i64 {
        self.context_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn order_index(&self) -> Option<i32> {
        self.order_index
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn chunk_index(&self) -> Option<i64> {
        self.metadata.get("chunk_index").and_then(|v| v.as_i64())
    }

    pub fn belongs_to_context(&self, context_id: i64) -> bool {
        self.context_id == context_id
    }
}

/// Orders chunks the way they are presented within a context: by
/// `order_index`, items without one last, ties broken by id.
pub fn sort_by_order(items: &mut [ContextItem]) {
    items.sort_by(|a, b| {
        let a_key = (a.order_index.is_none(), a.order_index, a.id);
        let b_key = (b.order_index.is_none(), b.order_index, b.id);
        a_key.cmp(&b_key)
    });
}

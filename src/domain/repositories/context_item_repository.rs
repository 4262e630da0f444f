use async_trait::async_trait;

use crate::domain::entities::{ContextItem, NewContextItem};
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait ContextItemRepository: Send + Sync {
    /// Deletes every item of the context and inserts `items` in a single
    /// transaction. Returns the stored items in insertion order.
    async fn replace_for_context(
        &self,
        context_id: i64,
        items: &[NewContextItem],
    ) -> Result<Vec<ContextItem>, RepositoryError>;

    async fn append(&self, item: &NewContextItem) -> Result<ContextItem, RepositoryError>;

    /// Items of a context ordered by `order_index`, ties by id.
    async fn find_by_context_id(&self, context_id: i64)
    -> Result<Vec<ContextItem>, RepositoryError>;

    async fn update_metadata(
        &self,
        id: i64,
        metadata: &serde_json::Value,
    ) -> Result<(), RepositoryError>;

    async fn count_by_context_id(&self, context_id: i64) -> Result<i64, RepositoryError>;
}

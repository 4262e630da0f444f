use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::entities::Topic;
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Topic>, RepositoryError>;

    /// Union of the context ids associated with any of the given topics.
    async fn context_ids_for_topics(
        &self,
        topic_ids: &[i64],
    ) -> Result<BTreeSet<i64>, RepositoryError>;

    /// Associates contexts with a topic; existing pairs are left alone.
    /// Returns the number of newly created associations.
    async fn assign_contexts(
        &self,
        topic_id: i64,
        context_ids: &[i64],
    ) -> Result<usize, RepositoryError>;

    /// Returns false when the topic does not exist.
    async fn update_system_prompt(
        &self,
        topic_id: i64,
        system_prompt: Option<&str>,
    ) -> Result<bool, RepositoryError>;
}

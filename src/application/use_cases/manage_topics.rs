use std::sync::Arc;

use crate::application::services::{QueryCache, TopicContextResolver};
use crate::application::use_cases::BulkOutcome;
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::TopicRepository;

/// Admin writes to topics. Every write invalidates the cached topic to
/// context resolution and the cached answers that depended on it.
pub struct ManageTopicsUseCase {
    topics: Arc<dyn TopicRepository>,
    resolver: Arc<TopicContextResolver>,
    query_cache: Arc<QueryCache>,
}

impl ManageTopicsUseCase {
    pub fn new(
        topics: Arc<dyn TopicRepository>,
        resolver: Arc<TopicContextResolver>,
        query_cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            topics,
            resolver,
            query_cache,
        }
    }

    pub async fn assign_contexts(
        &self,
        topic_ids: &[i64],
        context_ids: &[i64],
    ) -> RagResult<BulkOutcome> {
        if topic_ids.is_empty() || context_ids.is_empty() {
            return Err(RagError::invalid_input(
                "topic_ids and context_ids must not be empty",
            ));
        }

        let mut outcome = BulkOutcome::default();
        for &topic_id in topic_ids {
            let result = self.assign_to_topic(topic_id, context_ids).await;
            outcome.record(topic_id, result);
        }

        self.query_cache.purge_all().await;
        Ok(outcome)
    }

    async fn assign_to_topic(&self, topic_id: i64, context_ids: &[i64]) -> RagResult<()> {
        if self.topics.find_by_id(topic_id).await?.is_none() {
            return Err(RagError::not_found(format!("Topic {}", topic_id)));
        }

        let added = self.topics.assign_contexts(topic_id, context_ids).await?;
        if let Err(e) = self.resolver.invalidate(topic_id).await {
            tracing::warn!("Failed to invalidate contexts cached for topic {}: {}", topic_id, e);
        }
        tracing::info!("Assigned {} new contexts to topic {}", added, topic_id);
        Ok(())
    }

    pub async fn update_system_prompt(
        &self,
        topic_ids: &[i64],
        system_prompt: Option<&str>,
    ) -> RagResult<BulkOutcome> {
        if topic_ids.is_empty() {
            return Err(RagError::invalid_input("topic_ids must not be empty"));
        }

        let prompt = system_prompt.map(str::trim).filter(|p| !p.is_empty());

        let mut outcome = BulkOutcome::default();
        for &topic_id in topic_ids {
            let result = match self.topics.update_system_prompt(topic_id, prompt).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(RagError::not_found(format!("Topic {}", topic_id))),
                Err(e) => Err(e.into()),
            };
            outcome.record(topic_id, result);
        }

        self.query_cache.purge_all().await;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::QueryRequest;
    use crate::domain::errors::ErrorKind;
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::test_support::{FlakyCacheStore, Harness, InMemoryTopicRepository};

    #[tokio::test]
    async fn test_assignment_invalidates_resolution() {
        let harness = Harness::new();
        harness.seed_topic_with_chunks(1, 10, &["first context"]).await;
        harness.seed_topic_with_chunks(2, 20, &["second context"]).await;

        let before = harness
            .answer
            .execute(QueryRequest::new("context", vec![1]))
            .await
            .unwrap();
        assert_eq!(before.sources.len(), 1);

        let outcome = harness
            .manage_topics
            .assign_contexts(&[1, 404], &[20])
            .await
            .unwrap();
        assert_eq!(outcome.affected_count, 1);
        assert_eq!(outcome.failures[0].id, 404);
        assert_eq!(outcome.failures[0].error_kind, ErrorKind::NotFound);

        let after = harness
            .answer
            .execute(QueryRequest::new("context", vec![1]))
            .await
            .unwrap();
        assert_eq!(after.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_system_prompt_update() {
        let harness = Harness::new();
        harness.topics.add_topic(1, None);
        harness.topics.add_topic(2, None);

        let outcome = harness
            .manage_topics
            .update_system_prompt(&[1, 2, 3], Some("Be brief."))
            .await
            .unwrap();

        assert_eq!(outcome.affected_count, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(harness.topics.system_prompt(1), Some("Be brief.".to_string()));

        harness
            .manage_topics
            .update_system_prompt(&[1], Some("   "))
            .await
            .unwrap();
        assert_eq!(harness.topics.system_prompt(1), None);
    }

    #[tokio::test]
    async fn test_assignment_counts_when_invalidation_fails() {
        let topics = Arc::new(InMemoryTopicRepository::new());
        topics.add_topic(1, None);
        let store = Arc::new(FlakyCacheStore::new());
        store.fail_key_listing(true);
        let use_case = ManageTopicsUseCase::new(
            topics.clone(),
            Arc::new(TopicContextResolver::new(topics.clone(), store)),
            Arc::new(QueryCache::new(Arc::new(InMemoryCacheStore::new()), true)),
        );

        let outcome = use_case.assign_contexts(&[1], &[30, 31]).await.unwrap();
        assert_eq!(outcome.affected_count, 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            topics.context_ids_for_topics(&[1]).await.unwrap(),
            std::collections::BTreeSet::from([30, 31])
        );
    }
}

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::collections::BTreeSet;

use crate::domain::entities::Topic;
use crate::domain::repositories::{RepositoryError, TopicRepository};
use crate::infrastructure::database::models::{TopicContextLink, TopicModel};
use crate::infrastructure::database::schema::{topic, topic_contexts};
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresTopicRepository {
    pool: DbPool,
}

impl PostgresTopicRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TopicRepository for PostgresTopicRepository {
    async fn find_by_id(&self, topic_id: i64) -> Result<Option<Topic>, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let model = topic::table
                .find(topic_id)
                .select(TopicModel::as_select())
                .first(conn)
                .optional()?;
            Ok(model.map(Topic::from))
        })
        .await
    }

    async fn context_ids_for_topics(
        &self,
        topic_ids: &[i64],
    ) -> Result<BTreeSet<i64>, RepositoryError> {
        let topic_ids = topic_ids.to_vec();
        with_connection(&self.pool, move |conn| {
            let ids: Vec<i64> = topic_contexts::table
                .filter(topic_contexts::topic_id.eq_any(topic_ids))
                .select(topic_contexts::context_id)
                .distinct()
                .load(conn)?;
            Ok(ids.into_iter().collect())
        })
        .await
    }

    async fn assign_contexts(
        &self,
        topic_id: i64,
        context_ids: &[i64],
    ) -> Result<usize, RepositoryError> {
        let links: Vec<TopicContextLink> = context_ids
            .iter()
            .map(|&context_id| TopicContextLink {
                topic_id,
                context_id,
            })
            .collect();

        with_connection(&self.pool, move |conn| {
            let inserted = diesel::insert_into(topic_contexts::table)
                .values(&links)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(inserted)
        })
        .await
    }

    async fn update_system_prompt(
        &self,
        topic_id: i64,
        system_prompt: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let system_prompt = system_prompt.map(str::to_string);
        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(topic::table.find(topic_id))
                .set((
                    topic::system_prompt.eq(system_prompt),
                    topic::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }
}

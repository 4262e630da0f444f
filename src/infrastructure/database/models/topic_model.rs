use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::Topic;
use crate::infrastructure::database::schema::{topic, topic_contexts};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = topic)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TopicModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TopicModel> for Topic {
    fn from(model: TopicModel) -> Self {
        Topic::from_database(
            model.id,
            model.name,
            model.description,
            model.system_prompt,
            model.created_at,
            model.updated_at,
        )
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = topic_contexts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TopicContextLink {
    pub topic_id: i64,
    pub context_id: i64,
}

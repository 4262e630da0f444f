use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::usage_monitor::{CostEstimate, UsageSnapshot};
use crate::domain::entities::ContextItem;

#[derive(Debug, Deserialize)]
pub struct IngestRequestDto {
    pub path: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ReindexRequestDto {
    pub context_ids: Vec<i64>,
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Serialize)]
pub struct JobAcceptedDto {
    pub job_id: Uuid,
    pub status: String,
}

impl JobAcceptedDto {
    pub fn queued(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: "queued".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FaqEntryRequestDto {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ContextItemDto {
    pub id: i64,
    pub context_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
}

impl From<ContextItem> for ContextItemDto {
    fn from(item: ContextItem) -> Self {
        Self {
            id: item.id(),
            context_id: item.context_id(),
            title: item.title().to_string(),
            content: item.content().to_string(),
            order_index: item.order_index(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignContextsRequestDto {
    pub topic_ids: Vec<i64>,
    pub context_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SystemPromptRequestDto {
    pub topic_ids: Vec<i64>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageReportDto {
    pub stats: UsageSnapshot,
    pub cost: CostEstimate,
    pub recommendations: Vec<String>,
    pub rate_limited: bool,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offline work handed to the background workers. The job id is recorded as
/// the ingestion `task_id` in chunk metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    id: Uuid,
    job_type: JobType,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobType {
    Ingest {
        context_id: i64,
        path: String,
        title: String,
    },
    Reindex {
        context_ids: Vec<i64>,
        reset: bool,
    },
}

impl ProcessingJob {
    pub fn new_ingest(context_id: i64, path: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: JobType::Ingest {
                context_id,
                path,
                title,
            },
            created_at: Utc::now(),
        }
    }

    pub fn new_reindex(context_ids: Vec<i64>, reset: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: JobType::Reindex { context_ids, reset },
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_type(&self) -> &JobType {
        &self.job_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curated set of contexts users ask questions against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    id: i64,
    name: String,
    description: String,
    system_prompt: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Topic {
    pub fn from_database(
        id: i64,
        name: String,
        description: String,
        system_prompt: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            system_prompt,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Overrides the assistant role string used when generating answers.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

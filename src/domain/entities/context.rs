use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ContextKind, ProcessingStatus};

/// A source document and the chunks carved from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    id: i64,
    name: String,
    description: String,
    kind: ContextKind,
    original_content: Option<String>,
    chunk_count: i32,
    processing_status: ProcessingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Context {
    /// Create a Context from database values (for repository reconstruction)
    pub fn from_database(
        id: i64,
        name: String,
        description: String,
        kind: ContextKind,
        original_content: Option<String>,
        chunk_count: i32,
        processing_status: ProcessingStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind,
            original_content,
            chunk_count,
            processing_status,
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

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn original_content(&self) -> Option<&str> {
        self.original_content.as_deref()
    }

    pub fn chunk_count(&self) -> i32 {
        self.chunk_count
    }

    pub fn processing_status(&self) -> ProcessingStatus {
        self.processing_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Business logic methods
    pub fn transition_to(&mut self, status: ProcessingStatus) -> Result<(), String> {
        if !self.processing_status.can_transition_to(&status) {
            return Err(format!(
                "Context {} cannot move from {} to {}",
                self.id, self.processing_status, status
            ));
        }

        self.processing_status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves a finished (or abandoned) context back to PENDING so it can be
    /// processed again. A PENDING context is left untouched.
    pub fn reset_for_reindex(&mut self) -> Result<(), String> {
        if self.processing_status.is_pending() {
            return Ok(());
        }
        self.transition_to(ProcessingStatus::Pending)
    }

    pub fn start_processing(&mut self) -> Result<(), String> {
        self.transition_to(ProcessingStatus::Processing)
    }

    pub fn complete_processing(&mut self, chunk_count: i32) -> Result<(), String> {
        self.transition_to(ProcessingStatus::Completed)?;
        self.chunk_count = chunk_count;
        Ok(())
    }

    pub fn fail_processing(&mut self, chunk_count: Option<i32>) -> Result<(), String> {
        self.transition_to(ProcessingStatus::Failed)?;
        if let Some(count) = chunk_count {
            self.chunk_count = count;
        }
        Ok(())
    }

    pub fn set_original_content(&mut self, content: String) {
        self.original_content = Some(content);
        self.updated_at = Utc::now();
    }

    pub fn set_chunk_count(&mut self, chunk_count: i32) {
        self.chunk_count = chunk_count;
        self.updated_at = Utc::now();
    }
}

use serde::{Deserialize, Serialize};

/// Ingestion state of a context.
///
/// ```text
/// PENDING  ──ingest──▶ PROCESSING ──ok──▶ COMPLETED
///                         │                    │
///                         └─error──▶ FAILED ◀──┘
/// COMPLETED/FAILED ──reindex──▶ PENDING
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProcessingStatus::Pending)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, ProcessingStatus::Processing)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProcessingStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProcessingStatus::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed | ProcessingStatus::Failed
        )
    }

    pub fn can_transition_to(&self, new_status: &ProcessingStatus) -> bool {
        match (self, new_status) {
            (ProcessingStatus::Pending, ProcessingStatus::Processing) => true,
            (ProcessingStatus::Processing, ProcessingStatus::Completed) => true,
            (ProcessingStatus::Processing, ProcessingStatus::Failed) => true,
            // Reindex requests
            (ProcessingStatus::Completed, ProcessingStatus::Pending) => true,
            (ProcessingStatus::Failed, ProcessingStatus::Pending) => true,
            // Recovery after an ingest was cancelled mid-flight
            (ProcessingStatus::Processing, ProcessingStatus::Pending) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ProcessingStatus::Pending),
            "PROCESSING" => Ok(ProcessingStatus::Processing),
            "COMPLETED" => Ok(ProcessingStatus::Completed),
            "FAILED" => Ok(ProcessingStatus::Failed),
            _ => Err(format!("Invalid processing status: {}", s)),
        }
    }
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        ProcessingStatus::Pending
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

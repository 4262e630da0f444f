use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only log entry written for every answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionHistory {
    pub id: i64,
    pub topic_id: i64,
    pub question: String,
    pub answer: String,
    pub session_id: String,
    pub is_favorited: bool,
    pub feedback_score: i32,
    pub feedback_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestionHistory {
    pub topic_id: i64,
    pub question: String,
    pub answer: String,
    pub session_id: String,
}

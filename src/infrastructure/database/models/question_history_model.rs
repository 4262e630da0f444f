use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::{NewQuestionHistory, QuestionHistory};
use crate::infrastructure::database::schema::questionhistory;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = questionhistory)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuestionHistoryModel {
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

#[derive(Debug, Insertable)]
#[diesel(table_name = questionhistory)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewQuestionHistoryModel {
    pub topic_id: i64,
    pub question: String,
    pub answer: String,
    pub session_id: String,
}

impl From<&NewQuestionHistory> for NewQuestionHistoryModel {
    fn from(entry: &NewQuestionHistory) -> Self {
        Self {
            topic_id: entry.topic_id,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            session_id: entry.session_id.clone(),
        }
    }
}

impl From<QuestionHistoryModel> for QuestionHistory {
    fn from(model: QuestionHistoryModel) -> Self {
        QuestionHistory {
            id: model.id,
            topic_id: model.topic_id,
            question: model.question,
            answer: model.answer,
            session_id: model.session_id,
            is_favorited: model.is_favorited,
            feedback_score: model.feedback_score,
            feedback_comment: model.feedback_comment,
            created_at: model.created_at,
        }
    }
}

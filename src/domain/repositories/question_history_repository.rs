use async_trait::async_trait;

use crate::domain::entities::{NewQuestionHistory, QuestionHistory};
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait QuestionHistoryRepository: Send + Sync {
    async fn save(&self, entry: &NewQuestionHistory) -> Result<QuestionHistory, RepositoryError>;
}

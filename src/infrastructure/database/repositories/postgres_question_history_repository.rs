use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::{NewQuestionHistory, QuestionHistory};
use crate::domain::repositories::{QuestionHistoryRepository, RepositoryError};
use crate::infrastructure::database::models::{NewQuestionHistoryModel, QuestionHistoryModel};
use crate::infrastructure::database::schema::questionhistory;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresQuestionHistoryRepository {
    pool: DbPool,
}

impl PostgresQuestionHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionHistoryRepository for PostgresQuestionHistoryRepository {
    async fn save(&self, entry: &NewQuestionHistory) -> Result<QuestionHistory, RepositoryError> {
        let new_entry = NewQuestionHistoryModel::from(entry);
        with_connection(&self.pool, move |conn| {
            let inserted = diesel::insert_into(questionhistory::table)
                .values(&new_entry)
                .returning(QuestionHistoryModel::as_returning())
                .get_result(conn)?;
            Ok(QuestionHistory::from(inserted))
        })
        .await
    }
}

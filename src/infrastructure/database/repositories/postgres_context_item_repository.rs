use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use crate::domain::entities::{ContextItem, NewContextItem};
use crate::domain::repositories::{ContextItemRepository, RepositoryError};
use crate::infrastructure::database::models::{ContextItemModel, NewContextItemModel};
use crate::infrastructure::database::schema::contextitem;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresContextItemRepository {
    pool: DbPool,
}

impl PostgresContextItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContextItemRepository for PostgresContextItemRepository {
    async fn replace_for_context(
        &self,
        context_id: i64,
        items: &[NewContextItem],
    ) -> Result<Vec<ContextItem>, RepositoryError> {
        let new_items: Vec<NewContextItemModel> =
            items.iter().map(NewContextItemModel::from).collect();

        with_connection(&self.pool, move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(contextitem::table.filter(contextitem::context_id.eq(context_id)))
                    .execute(conn)?;

                if new_items.is_empty() {
                    return Ok(Vec::new());
                }

                let inserted: Vec<ContextItemModel> = diesel::insert_into(contextitem::table)
                    .values(&new_items)
                    .returning(ContextItemModel::as_returning())
                    .get_results(conn)?;

                Ok(inserted.into_iter().map(ContextItem::from).collect())
            })
            .map_err(RepositoryError::from)
        })
        .await
    }

    async fn append(&self, item: &NewContextItem) -> Result<ContextItem, RepositoryError> {
        let new_item = NewContextItemModel::from(item);
        with_connection(&self.pool, move |conn| {
            let inserted = diesel::insert_into(contextitem::table)
                .values(&new_item)
                .returning(ContextItemModel::as_returning())
                .get_result(conn)?;
            Ok(ContextItem::from(inserted))
        })
        .await
    }

    async fn find_by_context_id(
        &self,
        context_id: i64,
    ) -> Result<Vec<ContextItem>, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let models = contextitem::table
                .filter(contextitem::context_id.eq(context_id))
                .order((contextitem::order_index.asc().nulls_last(), contextitem::id.asc()))
                .select(ContextItemModel::as_select())
                .load(conn)?;
            Ok(models.into_iter().map(ContextItem::from).collect())
        })
        .await
    }

    async fn update_metadata(
        &self,
        item_id: i64,
        metadata: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let metadata = metadata.clone();
        with_connection(&self.pool, move |conn| {
            diesel::update(contextitem::table.find(item_id))
                .set((
                    contextitem::metadata.eq(metadata),
                    contextitem::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn count_by_context_id(&self, context_id: i64) -> Result<i64, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let count = contextitem::table
                .filter(contextitem::context_id.eq(context_id))
                .count()
                .get_result(conn)?;
            Ok(count)
        })
        .await
    }
}

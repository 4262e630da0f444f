use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::Context;
use crate::domain::repositories::{ContextRepository, RepositoryError};
use crate::infrastructure::database::models::{ContextChangeset, ContextModel};
use crate::infrastructure::database::schema::context;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresContextRepository {
    pool: DbPool,
}

impl PostgresContextRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContextRepository for PostgresContextRepository {
    async fn find_by_id(&self, context_id: i64) -> Result<Option<Context>, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let model = context::table
                .find(context_id)
                .select(ContextModel::as_select())
                .first(conn)
                .optional()?;

            model
                .map(|m| Context::try_from(m).map_err(RepositoryError::ValidationError))
                .transpose()
        })
        .await
    }

    async fn update(&self, ctx: &Context) -> Result<(), RepositoryError> {
        let context_id = ctx.id();
        let changes = ContextChangeset::from(ctx);

        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(context::table.find(context_id))
                .set(&changes)
                .execute(conn)?;

            if updated == 0 {
                return Err(RepositoryError::NotFound(format!("Context {}", context_id)));
            }
            Ok(())
        })
        .await
    }
}

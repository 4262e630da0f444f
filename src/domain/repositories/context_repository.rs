use async_trait::async_trait;

use crate::domain::entities::Context;
use crate::domain::repositories::RepositoryError;

#[async_trait]
pub trait ContextRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Context>, RepositoryError>;

    /// Persists status, chunk count and original content of the context.
    async fn update(&self, context: &Context) -> Result<(), RepositoryError>;
}

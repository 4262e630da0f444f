use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::RagResult;
use crate::domain::value_objects::ContextKind;

/// Extracts plain text from a source document.
///
/// Fails with `NotFound` when the path does not exist and `Parse` when the
/// document is malformed. Parsing has no side effects.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, kind: ContextKind, path: &Path) -> RagResult<String>;
}

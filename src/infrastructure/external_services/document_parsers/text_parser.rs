use std::path::Path;
use tokio::fs;

use super::io_error;
use crate::domain::errors::{RagError, RagResult};

async fn read_utf8(path: &Path) -> RagResult<String> {
    let bytes = fs::read(path).await.map_err(|e| io_error(path, e))?;
    String::from_utf8(bytes)
        .map_err(|e| RagError::Parse(format!("{} is not valid UTF-8: {}", path.display(), e)))
}

/// Markdown is indexed verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl MarkdownParser {
    pub async fn parse(&self, path: &Path) -> RagResult<String> {
        read_utf8(path).await
    }
}

/// FAQ files keep their Q/A layout; only the surrounding whitespace goes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FaqParser;

impl FaqParser {
    pub async fn parse(&self, path: &Path) -> RagResult<String> {
        Ok(read_utf8(path).await?.trim().to_string())
    }
}

use async_trait::async_trait;
use std::path::Path;

use super::{FaqParser, MarkdownParser, PdfParser};
use crate::application::ports::DocumentParser;
use crate::domain::errors::RagResult;
use crate::domain::value_objects::ContextKind;

/// Routes each document to the parser for its context kind.
#[derive(Debug, Default, Clone)]
pub struct CompositeDocumentParser {
    pdf_parser: PdfParser,
    markdown_parser: MarkdownParser,
    faq_parser: FaqParser,
}

impl CompositeDocumentParser {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentParser for CompositeDocumentParser {
    async fn parse(&self, kind: ContextKind, path: &Path) -> RagResult<String> {
        tracing::debug!("Parsing {} source {}", kind, path.display());
        match kind {
            ContextKind::Pdf => self.pdf_parser.parse(path).await,
            ContextKind::Markdown => self.markdown_parser.parse(path).await,
            ContextKind::Faq => self.faq_parser.parse(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatches_on_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faq.txt");
        std::fs::write(&path, "  Q: x?\nA: y  \n").unwrap();

        let parser = CompositeDocumentParser::new();
        assert_eq!(parser.parse(ContextKind::Faq, &path).await.unwrap(), "Q: x?\nA: y");
        assert_eq!(
            parser.parse(ContextKind::Markdown, &path).await.unwrap(),
            "  Q: x?\nA: y  \n"
        );
    }
}

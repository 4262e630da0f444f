pub mod composite_parser;
pub mod pdf_parser;
pub mod text_parser;

pub use composite_parser::CompositeDocumentParser;
pub use pdf_parser::PdfParser;
pub use text_parser::{FaqParser, MarkdownParser};

use std::io;
use std::path::Path;

use crate::domain::errors::RagError;

fn io_error(path: &Path, error: io::Error) -> RagError {
    match error.kind() {
        io::ErrorKind::NotFound => RagError::not_found(format!("Source file {}", path.display())),
        _ => RagError::Parse(format!("Cannot read {}: {}", path.display(), error)),
    }
}

use lopdf::{Document, Object};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::io_error;
use crate::domain::errors::{RagError, RagResult};

/// Extracts the text layer of a PDF, page by page, joining the non-empty
/// lines with newlines. Image-only documents yield an empty string.
#[derive(Debug, Default, Clone)]
pub struct PdfParser {
    password: String,
}

impl PdfParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub async fn parse(&self, path: &Path) -> RagResult<String> {
        let path = path.to_path_buf();
        let password = self.password.clone();
        tokio::task::spawn_blocking(move || extract_text(&path, &password))
            .await
            .map_err(|e| RagError::Parse(format!("PDF extraction task failed: {}", e)))?
    }
}

// Drops dictionary entries that carry no text to keep large documents cheap
// to load.
fn filter_func(object_id: (u32, u16), object: &mut Object) -> Option<((u32, u16), Object)> {
    static IGNORE: &[&[u8]] = &[
        b"Length",
        b"BBox",
        b"Matrix",
        b"Filter",
        b"ColorSpace",
        b"Width",
        b"Height",
        b"BitsPerComponent",
        b"PTEX.FileName",
        b"PTEX.PageNumber",
        b"PTEX.InfoDict",
        b"FontDescriptor",
        b"ExtGState",
        b"MediaBox",
    ];

    if let Object::Dictionary(dict) = object {
        let doomed: Vec<Vec<u8>> = dict
            .iter()
            .filter(|(key, _)| IGNORE.contains(&key.as_slice()))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            dict.remove(&key);
        }
    }

    Some((object_id, object.to_owned()))
}

fn extract_text(path: &PathBuf, password: &str) -> RagResult<String> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if metadata.len() == 0 {
        return Ok(String::new());
    }

    let mut doc = Document::load_filtered(path, filter_func)
        .map_err(|e| RagError::Parse(format!("Malformed PDF {}: {}", path.display(), e)))?;

    if doc.is_encrypted() {
        doc.decrypt(password)
            .map_err(|_| RagError::Parse(format!("Cannot decrypt PDF {}", path.display())))?;
    }

    let pages: Vec<u32> = doc.get_pages().into_keys().collect();
    let extracted: Vec<(u32, Result<String, String>)> = pages
        .into_par_iter()
        .map(|page| {
            let text = doc
                .extract_text(&[page])
                .map_err(|e| format!("page {}: {}", page, e));
            (page, text)
        })
        .collect();

    let mut page_texts = BTreeMap::new();
    let mut failed = 0usize;
    for (page, text) in extracted {
        match text {
            Ok(text) => {
                page_texts.insert(page, text);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("Skipping unreadable PDF {}", e);
            }
        }
    }

    if failed > 0 && page_texts.is_empty() {
        return Err(RagError::Parse(format!(
            "No readable pages in {}",
            path.display()
        )));
    }

    Ok(join_pages(&page_texts))
}

/// Concatenates page texts in page order, one non-empty line per row.
pub(crate) fn join_pages(page_texts: &BTreeMap<u32, String>) -> String {
    page_texts
        .values()
        .flat_map(|text| text.split('\n'))
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

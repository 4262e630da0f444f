use crate::domain::errors::{RagError, RagResult};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Break points tried in preference order before falling back to whitespace.
const SENTENCE_BREAKS: [&str; 4] = [". ", "! ", "? ", "\n\n"];

/// A chunk together with the character offset its window started at.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    pub start: usize,
    pub text: String,
}

/// Sliding-window splitter measured in characters.
///
/// Each window is closed at the last sentence break (or whitespace) found in
/// its second half, so chunks rarely cut through words. The next window starts
/// `overlap` characters before the previous one ended, or earlier when the
/// window had to cut through a word, and always strictly after the previous
/// start.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> RagResult<Self> {
        if chunk_size == 0 {
            return Err(RagError::invalid_input("chunk_size must be positive"));
        }
        if overlap >= chunk_size {
            return Err(RagError::invalid_input(
                "overlap must be smaller than chunk_size",
            ));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.chunk_spans(text)
            .into_iter()
            .map(|span| span.text)
            .collect()
    }

    pub fn chunk_spans(&self, text: &str) -> Vec<ChunkSpan> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len == 0 {
            return Vec::new();
        }
        if len <= self.chunk_size {
            return vec![ChunkSpan {
                start: 0,
                text: text.to_string(),
            }];
        }

        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            let mut end = (start + self.chunk_size).min(len);
            let mut split_word_start = None;
            if end < len {
                end = start + Self::break_offset(&chars[start..end]);
                if !chars[end - 1].is_whitespace() && !chars[end].is_whitespace() {
                    split_word_start = chars[start..end]
                        .iter()
                        .rposition(|c| c.is_whitespace())
                        .map(|position| start + position + 1);
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                spans.push(ChunkSpan {
                    start,
                    text: trimmed.to_string(),
                });
            }

            if end >= len {
                break;
            }

            // A word cut at the hard boundary is restarted whole in the next window.
            let next = end.saturating_sub(self.overlap);
            start = split_word_start
                .map_or(next, |word_start| next.min(word_start))
                .max(start + 1);
        }

        spans
    }

    /// Length of the chunk to cut from `window`: just past the preferred break
    /// in the second half of the window, or the whole window.
    fn break_offset(window: &[char]) -> usize {
        let half = window.len() / 2;

        for separator in SENTENCE_BREAKS {
            let separator: Vec<char> = separator.chars().collect();
            if let Some(position) = rfind_from(window, &separator, half) {
                return position + separator.len();
            }
        }

        window
            .iter()
            .rposition(|c| c.is_whitespace())
            .filter(|position| *position >= half)
            .map(|position| position + 1)
            .unwrap_or(window.len())
    }
}

fn rfind_from(haystack: &[char], needle: &[char], min_position: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (min_position..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}

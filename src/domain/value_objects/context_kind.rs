use serde::{Deserialize, Serialize};

/// Source document format of a context; selects the parser used on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextKind {
    Pdf,
    Markdown,
    Faq,
}

impl ContextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Pdf => "PDF",
            ContextKind::Markdown => "MARKDOWN",
            ContextKind::Faq => "FAQ",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "PDF" => Ok(ContextKind::Pdf),
            "MARKDOWN" => Ok(ContextKind::Markdown),
            "FAQ" => Ok(ContextKind::Faq),
            _ => Err(format!("Invalid context kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

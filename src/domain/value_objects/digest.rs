use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex encoded SHA-256 digest used for content-addressed cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Digest of the embedding cache key `model || "::" || text`.
    pub fn for_embedding(model: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"::");
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Sha256Digest> for String {
    fn from(hash: Sha256Digest) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_key_separates_model_and_text() {
        let a = Sha256Digest::for_embedding("text-embedding-3-small", "hello");
        let b = Sha256Digest::for_embedding("text-embedding-3-large", "hello");
        assert_ne!(a, b);
        assert_eq!(a, Sha256Digest::from_bytes(b"text-embedding-3-small::hello"));
    }
}

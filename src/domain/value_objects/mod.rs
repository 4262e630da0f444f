pub mod context_kind;
pub mod digest;
pub mod processing_status;

pub use context_kind::ContextKind;
pub use digest::Sha256Digest;
pub use processing_status::ProcessingStatus;

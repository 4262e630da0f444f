pub mod admin_handler;
pub mod rag_handler;

pub use admin_handler::AdminHandler;
pub use rag_handler::RagHandler;

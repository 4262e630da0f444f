pub mod context_item_repository;
pub mod context_repository;
pub mod question_history_repository;
pub mod repository_error;
pub mod topic_repository;

pub use context_item_repository::ContextItemRepository;
pub use context_repository::ContextRepository;
pub use question_history_repository::QuestionHistoryRepository;
pub use repository_error::RepositoryError;
pub use topic_repository::TopicRepository;

pub mod postgres_context_item_repository;
pub mod postgres_context_repository;
pub mod postgres_question_history_repository;
pub mod postgres_topic_repository;

pub use postgres_context_item_repository::PostgresContextItemRepository;
pub use postgres_context_repository::PostgresContextRepository;
pub use postgres_question_history_repository::PostgresQuestionHistoryRepository;
pub use postgres_topic_repository::PostgresTopicRepository;

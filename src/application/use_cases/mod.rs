pub mod answer_question;
pub mod append_faq_entry;
pub mod bulk;
pub mod ingest_context;
pub mod manage_topics;
pub mod reindex_contexts;

pub use answer_question::{AnswerQuestionUseCase, QueryRequest, QueryResult, QuerySettings, Source};
pub use append_faq_entry::AppendFaqEntryUseCase;
pub use bulk::{BulkFailure, BulkOutcome};
pub use ingest_context::{IngestContextUseCase, IngestOutcome, IngestRequest};
pub use manage_topics::ManageTopicsUseCase;
pub use reindex_contexts::ReindexContextsUseCase;

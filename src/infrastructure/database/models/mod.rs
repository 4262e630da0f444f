pub mod context_item_model;
pub mod context_model;
pub mod question_history_model;
pub mod topic_model;
pub mod vector_point_model;

pub use context_item_model::*;
pub use context_model::*;
pub use question_history_model::*;
pub use topic_model::*;
pub use vector_point_model::*;

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

pub use errors::{ErrorKind, RagError, RagResult};

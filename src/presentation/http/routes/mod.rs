pub mod admin_routes;
pub mod health_routes;
pub mod rag_routes;

pub use admin_routes::*;
pub use health_routes::*;
pub use rag_routes::*;

pub mod admin_dto;
pub mod ask_dto;
pub mod response_dto;

pub use admin_dto::*;
pub use ask_dto::*;
pub use response_dto::*;

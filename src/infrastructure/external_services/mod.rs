pub mod cross_encoder_client;
pub mod document_parsers;
pub mod openai_client;

pub use cross_encoder_client::{CrossEncoderConfig, HttpCrossEncoder};
pub use document_parsers::CompositeDocumentParser;
pub use openai_client::{OpenAiClient, OpenAiConfig};

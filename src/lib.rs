// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod aws;
pub mod config;
pub mod error;
pub mod knowledge_base;
pub mod mcp;
pub mod models;
pub mod retriever;
pub mod storage;
pub mod utils;

pub use aws::CredentialSource;
pub use config::Config;
pub use error::{KbError, Result};
pub use knowledge_base::{BedrockKnowledgeBase, KnowledgeBase};
pub use mcp::KnowledgeBaseMcp;
pub use models::{FormattedEntry, ResultLocation, RetrievalReport, RetrievalResult};
pub use retriever::Retriever;
pub use storage::{LinkGenerator, S3Presigner, S3Uri, generate_presigned_url};

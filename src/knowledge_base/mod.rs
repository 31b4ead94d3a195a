// file: src/knowledge_base/mod.rs
// description: vector search backend abstraction and the Bedrock implementation
// reference: internal module structure

pub mod bedrock;

pub use bedrock::BedrockKnowledgeBase;

use crate::error::Result;
use crate::models::RetrievalResult;
use async_trait::async_trait;

/// Semantic search over a managed knowledge base.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Returns at most `number_of_results` matches, best first.
    async fn retrieve(
        &self,
        knowledge_base_id: &str,
        query: &str,
        number_of_results: usize,
    ) -> Result<Vec<RetrievalResult>>;
}

// file: src/mcp/server.rs
// description: MCP server exposing the knowledge base retrieve tool
// reference: https://docs.rs/rmcp

use crate::config::Config;
use crate::retriever::Retriever;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, schemars, tool, tool_handler, tool_router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub const RETRIEVE_TOOL: &str = "retrieve";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RetrieveRequest {
    /// The question or search query to find relevant documents.
    pub query: String,
}

/// Tool description with the configured knowledge base blurb in the middle.
pub fn tool_description(knowledge_base_description: &str) -> String {
    format!(
        "Retrieve relevant documents from a Bedrock Knowledge Base\n\
         \n\
         {}\n\
         \n\
         Args:\n    \
         query: The question or search query to find relevant documents.\n\
         \n\
         Returns:\n    \
         Retrieved documents with their content and metadata.",
        knowledge_base_description
    )
}

#[derive(Clone)]
pub struct KnowledgeBaseMcp {
    retriever: Arc<Retriever>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KnowledgeBaseMcp {
    pub fn new(retriever: Retriever) -> Self {
        let mut tool_router = Self::tool_router();
        let description = tool_description(&retriever.config().knowledge_base_description);
        if let Some(route) = tool_router.map.get_mut(RETRIEVE_TOOL) {
            route.attr = Tool::new(
                route.attr.name.clone(),
                description,
                route.attr.input_schema.clone(),
            );
        }

        Self {
            retriever: Arc::new(retriever),
            tool_router,
        }
    }

    pub async fn from_config(config: Config) -> crate::error::Result<Self> {
        let retriever = Retriever::from_config(Arc::new(config)).await?;
        Ok(Self::new(retriever))
    }

    pub fn get_tool_router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "Retrieve relevant documents from a Bedrock Knowledge Base")]
    async fn retrieve(
        &self,
        Parameters(RetrieveRequest { query }): Parameters<RetrieveRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: retrieve called");

        // failures are reported as text, not as protocol errors
        let text = self.retriever.retrieve(&query).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for KnowledgeBaseMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Use the `{}` tool to search {} and cite the linked sources.",
                RETRIEVE_TOOL,
                self.retriever.config().knowledge_base_description
            )),
            ..Default::default()
        }
    }
}

// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KbError>;

/// Text returned by the tool when no knowledge base is configured.
pub const MISSING_KNOWLEDGE_BASE_MESSAGE: &str =
    "Error: KNOWLEDGE_BASE_ID environment variable is not set.";

#[derive(Error, Debug)]
pub enum KbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("KNOWLEDGE_BASE_ID environment variable is not set")]
    MissingKnowledgeBaseId,

    #[error("Retrieve request failed: {message}")]
    Retrieve { message: String },

    #[error("Presign request failed: {message}")]
    Presign { message: String },

    #[error("Malformed S3 URI: {0}")]
    MalformedUri(String),

    #[error("Credential resolution failed: {0}")]
    Credentials(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KbError {
    /// Underlying message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Config(message)
            | Self::Credentials(message)
            | Self::Signing(message)
            | Self::Transport(message) => message.clone(),
            Self::Retrieve { message } | Self::Presign { message } => message.clone(),
            Self::MalformedUri(uri) => format!("not a valid s3://bucket/key URI: {}", uri),
            Self::MissingKnowledgeBaseId => self.to_string(),
            Self::Http(e) => e.to_string(),
            Self::Serialization(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Converts a failed retrieve into the text handed back to the tool caller.
    pub fn tool_message(&self) -> String {
        match self {
            Self::MissingKnowledgeBaseId => MISSING_KNOWLEDGE_BASE_MESSAGE.to_string(),
            other => format!("Error calling Bedrock retrieve: {}", other.detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_knowledge_base_message() {
        assert_eq!(
            KbError::MissingKnowledgeBaseId.tool_message(),
            "Error: KNOWLEDGE_BASE_ID environment variable is not set."
        );
    }

    #[test]
    fn test_backend_failure_message() {
        let err = KbError::Retrieve {
            message: "An error occurred (AccessDeniedException) when calling the Retrieve operation: denied"
                .to_string(),
        };
        assert_eq!(
            err.tool_message(),
            "Error calling Bedrock retrieve: An error occurred (AccessDeniedException) when calling the Retrieve operation: denied"
        );
    }

    #[test]
    fn test_credentials_failure_message() {
        let err = KbError::Credentials("no providers in chain".to_string());
        assert!(err.tool_message().starts_with("Error calling Bedrock retrieve: "));
        assert!(err.tool_message().ends_with("no providers in chain"));
    }
}

// file: src/models/retrieval_result.rs
// description: Ranked knowledge base match returned by the search backend
// reference: Bedrock Agent Runtime Retrieve response

use serde::{Deserialize, Serialize};

/// Marker shown when an S3 location carries no URI.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Where a matched chunk came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultLocation {
    S3 { uri: Option<String> },
    /// Any non-S3 location type (web, confluence, ...), by type name.
    Other(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,

    /// Relevance score, backend-defined range (higher is more relevant)
    pub score: f64,

    pub location: ResultLocation,
}

impl RetrievalResult {
    pub fn new(content: impl Into<String>, score: f64, location: ResultLocation) -> Self {
        Self {
            content: content.into(),
            score,
            location,
        }
    }

    /// A usable S3 URI, skipping missing, blank and placeholder values.
    pub fn s3_uri(&self) -> Option<&str> {
        match &self.location {
            ResultLocation::S3 { uri: Some(uri) }
                if !uri.trim().is_empty() && uri != UNKNOWN_SOURCE =>
            {
                Some(uri.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_uri_present() {
        let result = RetrievalResult::new(
            "text",
            0.5,
            ResultLocation::S3 {
                uri: Some("s3://bucket/key.pdf".to_string()),
            },
        );
        assert_eq!(result.s3_uri(), Some("s3://bucket/key.pdf"));
    }

    #[test]
    fn test_s3_uri_placeholder_is_ignored() {
        let missing = RetrievalResult::new("text", 0.5, ResultLocation::S3 { uri: None });
        let placeholder = RetrievalResult::new(
            "text",
            0.5,
            ResultLocation::S3 {
                uri: Some("Unknown".to_string()),
            },
        );
        let web = RetrievalResult::new("text", 0.5, ResultLocation::Other("WEB".to_string()));

        assert_eq!(missing.s3_uri(), None);
        assert_eq!(placeholder.s3_uri(), None);
        assert_eq!(web.s3_uri(), None);
    }
}

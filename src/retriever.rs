// file: src/retriever.rs
// description: retrieve tool handler turning a query into a formatted source report
// reference: Bedrock knowledge base retrieval with presigned source links

use crate::aws::CredentialSource;
use crate::config::Config;
use crate::error::{KbError, Result};
use crate::knowledge_base::{BedrockKnowledgeBase, KnowledgeBase};
use crate::models::{
    FormattedEntry, ResultLocation, RetrievalReport, RetrievalResult, SourceDescriptor,
};
use crate::models::retrieval_result::UNKNOWN_SOURCE;
use crate::storage::{LinkGenerator, S3Presigner, generate_presigned_url};
use std::sync::Arc;
use tracing::{error, info};

/// Stateless between calls; clones share the same backend handles.
#[derive(Clone)]
pub struct Retriever {
    config: Arc<Config>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    links: Arc<dyn LinkGenerator>,
}

impl Retriever {
    pub fn new(
        config: Arc<Config>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        links: Arc<dyn LinkGenerator>,
    ) -> Self {
        Self {
            config,
            knowledge_base,
            links,
        }
    }

    /// Wires the Bedrock and S3 backends, sharing one credential source.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let credentials = CredentialSource::from_config(&config).await?;
        let knowledge_base = BedrockKnowledgeBase::new(&config, credentials.clone())?;
        let links = S3Presigner::new(&config, credentials)?;

        Ok(Self::new(config, Arc::new(knowledge_base), Arc::new(links)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the query and formats every match in backend order.
    pub async fn run(&self, query: &str) -> Result<RetrievalReport> {
        let knowledge_base_id = self
            .config
            .knowledge_base_id
            .as_deref()
            .ok_or(KbError::MissingKnowledgeBaseId)?;

        let results = self
            .knowledge_base
            .retrieve(knowledge_base_id, query, self.config.max_results)
            .await?;

        let mut entries = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            let source = self.describe_source(&result).await;
            entries.push(FormattedEntry::new(
                i + 1,
                result.score,
                source,
                result.content,
            ));
        }

        Ok(RetrievalReport::new(entries))
    }

    /// Tool boundary: always yields text, errors included.
    pub async fn retrieve(&self, query: &str) -> String {
        info!("Retrieving for query ({} chars)", query.chars().count());

        match self.run(query).await {
            Ok(report) => {
                info!("Retrieved {} entries", report.len());
                report.to_string()
            }
            Err(e) => {
                error!("Retrieve failed: {}", e);
                e.tool_message()
            }
        }
    }

    async fn describe_source(&self, result: &RetrievalResult) -> SourceDescriptor {
        match (&result.location, result.s3_uri()) {
            (_, Some(uri)) => {
                let link = generate_presigned_url(self.links.as_ref(), uri).await;
                SourceDescriptor::linked(uri, link)
            }
            (ResultLocation::S3 { uri }, None) => SourceDescriptor::Raw(
                uri.as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or(UNKNOWN_SOURCE)
                    .to_string(),
            ),
            _ => SourceDescriptor::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::storage::S3Uri;

    struct CannedKnowledgeBase {
        results: Vec<RetrievalResult>,
        fail_with: Option<String>,
        calls: AtomicUsize,
        last_limit: AtomicUsize,
    }

    impl CannedKnowledgeBase {
        fn returning(results: Vec<RetrievalResult>) -> Self {
            Self {
                results,
                fail_with: None,
                calls: AtomicUsize::new(0),
                last_limit: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::returning(vec![])
            }
        }
    }

    #[async_trait]
    impl KnowledgeBase for CannedKnowledgeBase {
        async fn retrieve(
            &self,
            _knowledge_base_id: &str,
            _query: &str,
            number_of_results: usize,
        ) -> Result<Vec<RetrievalResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_limit.store(number_of_results, Ordering::SeqCst);
            match &self.fail_with {
                Some(message) => Err(KbError::Retrieve {
                    message: message.clone(),
                }),
                None => Ok(self.results.clone()),
            }
        }
    }

    struct FakeLinks;

    #[async_trait]
    impl LinkGenerator for FakeLinks {
        async fn presign(&self, uri: &S3Uri) -> Result<String> {
            Ok(format!("https://links.test/{}/{}?sig", uri.bucket, uri.key))
        }
    }

    fn config_with_kb() -> Config {
        let mut config = Config::default_config();
        config.knowledge_base_id = Some("KB12345678".to_string());
        config
    }

    fn retriever(config: Config, kb: Arc<CannedKnowledgeBase>) -> Retriever {
        Retriever::new(Arc::new(config), kb, Arc::new(FakeLinks))
    }

    fn s3(uri: &str) -> ResultLocation {
        ResultLocation::S3 {
            uri: Some(uri.to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_knowledge_base_id_skips_backend() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![]));
        let retriever = retriever(Config::default_config(), kb.clone());

        assert_eq!(
            retriever.retrieve("anything").await,
            "Error: KNOWLEDGE_BASE_ID environment variable is not set."
        );
        assert!(matches!(
            retriever.run("anything").await,
            Err(KbError::MissingKnowledgeBaseId)
        ));
        assert_eq!(kb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_results() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![]));
        let retriever = retriever(config_with_kb(), kb);

        assert_eq!(
            retriever.retrieve("").await,
            "No relevant documents found in the knowledge base."
        );
    }

    #[tokio::test]
    async fn test_entries_in_backend_order() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![
            RetrievalResult::new("first", 0.8234, s3("s3://my-bucket/docs/report.pdf")),
            RetrievalResult::new("second", 0.95, ResultLocation::Unknown),
            RetrievalResult::new("third", 0.1, ResultLocation::S3 { uri: None }),
        ]));
        let retriever = retriever(config_with_kb(), kb);

        let text = retriever.retrieve("revenue").await;
        assert_eq!(
            text,
            "[1] (Score: 0.823) Source: [report.pdf](https://links.test/my-bucket/docs/report.pdf?sig)\nfirst\
             \n\n---\n\n\
             [2] (Score: 0.950) \nsecond\
             \n\n---\n\n\
             [3] (Score: 0.100) Source: Unknown\nthird"
        );
        assert_eq!(text.split("\n\n---\n\n").count(), 3);
    }

    #[tokio::test]
    async fn test_max_results_forwarded() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![]));
        let mut config = config_with_kb();
        config.max_results = 12;
        let retriever = retriever(config, kb.clone());

        retriever.run("q").await.unwrap();
        assert_eq!(kb.last_limit.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_text() {
        let kb = Arc::new(CannedKnowledgeBase::failing("connection refused"));
        let retriever = retriever(config_with_kb(), kb);

        assert_eq!(
            retriever.retrieve("q").await,
            "Error calling Bedrock retrieve: connection refused"
        );
    }

    #[tokio::test]
    async fn test_malformed_s3_uri_shown_unsigned() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![RetrievalResult::new(
            "body",
            0.5,
            s3("s3://bucket-only"),
        )]));
        let retriever = retriever(config_with_kb(), kb);

        let report = retriever.run("q").await.unwrap();
        assert_eq!(
            report.entries[0].source,
            SourceDescriptor::Linked {
                filename: "bucket-only".to_string(),
                link: "s3://bucket-only".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_non_s3_location_has_no_source() {
        let kb = Arc::new(CannedKnowledgeBase::returning(vec![RetrievalResult::new(
            "web page",
            0.7,
            ResultLocation::Other("WEB".to_string()),
        )]));
        let retriever = retriever(config_with_kb(), kb);

        assert_eq!(retriever.retrieve("q").await, "[1] (Score: 0.700) \nweb page");
    }
}

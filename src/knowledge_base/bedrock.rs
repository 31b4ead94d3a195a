// file: src/knowledge_base/bedrock.rs
// description: Bedrock Agent Runtime Retrieve client over signed HTTPS requests
// reference: https://docs.aws.amazon.com/bedrock/latest/APIReference/API_agent-runtime_Retrieve.html

use crate::aws::{CredentialSource, SigningScope, sigv4};
use crate::config::Config;
use crate::error::{KbError, Result};
use crate::knowledge_base::KnowledgeBase;
use crate::models::{ResultLocation, RetrievalResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

const SIGNING_SERVICE: &str = "bedrock";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";
const JSON_CONTENT_TYPE: &str = "application/json";

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(20);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<WireResult>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResult {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<WireLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct WireContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLocation {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    s3_location: Option<WireS3Location>,
}

#[derive(Debug, Default, Deserialize)]
struct WireS3Location {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

impl From<WireResult> for RetrievalResult {
    fn from(wire: WireResult) -> Self {
        let location = match wire.location {
            Some(WireLocation {
                kind: Some(kind),
                s3_location,
            }) if kind == "S3" => ResultLocation::S3 {
                uri: s3_location.and_then(|s3| s3.uri),
            },
            Some(WireLocation {
                kind: Some(kind), ..
            }) => ResultLocation::Other(kind),
            _ => ResultLocation::Unknown,
        };

        RetrievalResult {
            content: wire.content.and_then(|c| c.text).unwrap_or_default(),
            score: wire.score.unwrap_or(0.0),
            location,
        }
    }
}

/// Knowledge base backed by the Bedrock Agent Runtime `Retrieve` API.
#[derive(Debug, Clone)]
pub struct BedrockKnowledgeBase {
    client: Client,
    credentials: CredentialSource,
    region: String,
    endpoint: Url,
    max_attempts: u32,
}

impl BedrockKnowledgeBase {
    pub fn new(config: &Config, credentials: CredentialSource) -> Result<Self> {
        let endpoint = match &config.bedrock_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://bedrock-agent-runtime.{}.amazonaws.com",
                config.aws_region
            ),
        };
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            KbError::Config(format!("Invalid Bedrock endpoint {}: {}", endpoint, e))
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            credentials,
            region: config.aws_region.clone(),
            endpoint,
            max_attempts: config.max_attempts.max(1),
        })
    }

    async fn send_once(&self, url: &Url, body: &[u8]) -> Result<reqwest::Response> {
        let credentials = self.credentials.resolve().await?;
        let signed_headers = sigv4::sign_request(
            &credentials,
            SigningScope::now(&self.region, SIGNING_SERVICE),
            "POST",
            url.as_str(),
            &[("content-type", JSON_CONTENT_TYPE)],
            body,
        )?;

        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body.to_vec());
        for (name, value) in signed_headers {
            request = request.header(name, value);
        }

        Ok(request.send().await?)
    }

    async fn error_from_response(response: reqwest::Response) -> KbError {
        let status = response.status();
        let code = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(':').next())
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);

        KbError::Retrieve {
            message: format!(
                "An error occurred ({}) when calling the Retrieve operation: {}",
                code, message
            ),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &KbError) -> bool {
    matches!(err, KbError::Http(e) if e.is_connect() || e.is_timeout())
}

/// Exponential delay before retry number `retry` (1-based), capped.
fn backoff(retry: u32) -> Duration {
    let factor = 2u32.saturating_pow(retry.saturating_sub(1));
    RETRY_BASE_DELAY.saturating_mul(factor).min(RETRY_MAX_DELAY)
}

#[async_trait]
impl KnowledgeBase for BedrockKnowledgeBase {
    async fn retrieve(
        &self,
        knowledge_base_id: &str,
        query: &str,
        number_of_results: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let path = format!(
            "/knowledgebases/{}/retrieve",
            sigv4::uri_encode(knowledge_base_id)
        );
        let body = serde_json::to_vec(&RetrieveRequest {
            retrieval_query: RetrievalQuery {
                text: query,
                kind: "TEXT",
            },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration { number_of_results },
            },
        })?;

        let url = self.endpoint.join(&path).map_err(|e| {
            KbError::Config(format!("Invalid retrieve URL for {}: {}", knowledge_base_id, e))
        })?;

        debug!(
            "Requesting {} results from knowledge base {} ({} query chars)",
            number_of_results,
            knowledge_base_id,
            query.chars().count()
        );

        let mut attempt = 1;
        let response = loop {
            let failure = match self.send_once(&url, &body).await {
                Ok(response) if response.status().is_success() => break response,
                Ok(response) => {
                    let retryable = is_retryable_status(response.status());
                    (Self::error_from_response(response).await, retryable)
                }
                Err(err) => {
                    let retryable = is_retryable_error(&err);
                    (err, retryable)
                }
            };

            match failure {
                (err, true) if attempt < self.max_attempts => {
                    let delay = backoff(attempt);
                    warn!(
                        "Bedrock retrieve attempt {}/{} failed, retrying in {:?}: {}",
                        attempt, self.max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                (err, _) => {
                    error!("Bedrock retrieve failed: {}", err);
                    return Err(err);
                }
            }
        };

        let parsed: RetrieveResponse = response.json().await?;
        debug!("Received {} retrieval results", parsed.retrieval_results.len());

        Ok(parsed
            .retrieval_results
            .into_iter()
            .map(RetrievalResult::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RetrieveRequest {
            retrieval_query: RetrievalQuery {
                text: "what is the refund policy?",
                kind: "TEXT",
            },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: 5,
                },
            },
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "retrievalQuery": {"text": "what is the refund policy?", "type": "TEXT"},
                "retrievalConfiguration": {"vectorSearchConfiguration": {"numberOfResults": 5}}
            })
        );
    }

    #[test]
    fn test_response_conversion() {
        let response: RetrieveResponse = serde_json::from_value(serde_json::json!({
            "retrievalResults": [
                {
                    "content": {"text": "Refunds within 30 days.", "type": "TEXT"},
                    "location": {"type": "S3", "s3Location": {"uri": "s3://docs/policy.pdf"}},
                    "score": 0.8234,
                    "metadata": {"x-amz-bedrock-kb-chunk-id": "1"}
                },
                {
                    "content": {"text": "From the wiki."},
                    "location": {"type": "WEB", "webLocation": {"url": "https://example.com"}},
                    "score": 0.41
                },
                {}
            ]
        }))
        .unwrap();

        let results: Vec<RetrievalResult> = response
            .retrieval_results
            .into_iter()
            .map(RetrievalResult::from)
            .collect();

        assert_eq!(
            results,
            vec![
                RetrievalResult::new(
                    "Refunds within 30 days.",
                    0.8234,
                    ResultLocation::S3 {
                        uri: Some("s3://docs/policy.pdf".to_string())
                    }
                ),
                RetrievalResult::new("From the wiki.", 0.41, ResultLocation::Other("WEB".to_string())),
                RetrievalResult::new("", 0.0, ResultLocation::Unknown),
            ]
        );
    }

    #[test]
    fn test_s3_location_without_uri() {
        let wire: WireResult = serde_json::from_value(serde_json::json!({
            "location": {"type": "S3"}
        }))
        .unwrap();
        assert_eq!(
            RetrievalResult::from(wire).location,
            ResultLocation::S3 { uri: None }
        );
    }

    #[test]
    fn test_default_endpoint_from_region() {
        let mut config = Config::default_config();
        config.aws_region = "eu-central-1".to_string();
        let kb = BedrockKnowledgeBase::new(&config, CredentialSource::from_static("a", "b", None))
            .unwrap();
        assert_eq!(
            kb.endpoint.as_str(),
            "https://bedrock-agent-runtime.eu-central-1.amazonaws.com/"
        );
        assert_eq!(kb.max_attempts, 3);
    }

    #[test]
    fn test_retry_classification() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_error(&KbError::Credentials("expired".to_string())));
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(2));
        assert_eq!(backoff(10), Duration::from_secs(20));
        assert_eq!(backoff(40), Duration::from_secs(20));
    }
}

// file: src/storage/presign.rs
// description: Time-limited S3 GET links signed with SigV4 query parameters
// reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html

use crate::aws::{CredentialSource, SigningScope, sigv4};
use crate::config::Config;
use crate::error::{KbError, Result};
use crate::storage::{LinkGenerator, S3Uri};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

const SIGNING_SERVICE: &str = "s3";

/// Presigns `GetObject` requests; every call signs anew.
#[derive(Debug, Clone)]
pub struct S3Presigner {
    credentials: CredentialSource,
    region: String,
    endpoint: Option<Url>,
    expires_in: u64,
}

impl S3Presigner {
    pub fn new(config: &Config, credentials: CredentialSource) -> Result<Self> {
        let endpoint = config
            .s3_endpoint
            .as_deref()
            .map(|endpoint| {
                Url::parse(endpoint).map_err(|e| {
                    KbError::Config(format!("Invalid S3 endpoint {}: {}", endpoint, e))
                })
            })
            .transpose()?;

        Ok(Self {
            credentials,
            region: config.aws_region.clone(),
            endpoint,
            expires_in: config.presigned_url_expiration,
        })
    }

    /// Scheme, host and unencoded path for the object.
    ///
    /// Path style for dotted bucket names and custom endpoints,
    /// virtual-hosted style otherwise.
    fn target(&self, uri: &S3Uri) -> Result<(String, String, String)> {
        if let Some(endpoint) = &self.endpoint {
            let host = endpoint.host_str().ok_or_else(|| {
                KbError::Config(format!("S3 endpoint has no host: {}", endpoint))
            })?;
            let host = match endpoint.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            return Ok((
                endpoint.scheme().to_string(),
                host,
                format!("/{}/{}", uri.bucket, uri.key),
            ));
        }

        if uri.bucket.contains('.') {
            Ok((
                "https".to_string(),
                format!("s3.{}.amazonaws.com", self.region),
                format!("/{}/{}", uri.bucket, uri.key),
            ))
        } else {
            Ok((
                "https".to_string(),
                format!("{}.s3.{}.amazonaws.com", uri.bucket, self.region),
                format!("/{}", uri.key),
            ))
        }
    }
}

#[async_trait]
impl LinkGenerator for S3Presigner {
    async fn presign(&self, uri: &S3Uri) -> Result<String> {
        let (scheme, host, path) = self.target(uri)?;
        let url = format!("{}://{}{}", scheme, host, sigv4::encode_path(&path));
        let credentials = self.credentials.resolve().await?;

        let link = sigv4::presign_get(
            &credentials,
            SigningScope::now(&self.region, SIGNING_SERVICE),
            &url,
            Duration::from_secs(self.expires_in),
        )
        .map_err(|e| KbError::Presign {
            message: e.detail(),
        })?;

        debug!("Presigned {} for {}s", uri, self.expires_in);
        Ok(link)
    }
}

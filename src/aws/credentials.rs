// file: src/aws/credentials.rs
// description: AWS credential resolution from static keys or the SDK default provider chain
// reference: https://docs.rs/aws-config

use crate::config::Config;
use crate::error::{KbError, Result};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Chain credentials are refreshed this long before they expire.
pub const REFRESH_BEFORE_EXPIRY: Duration = Duration::from_secs(300);

const STATIC_PROVIDER_NAME: &str = "BedrockKbConfig";

/// Request credentials shared by the Bedrock client and the S3 presigner.
///
/// The provider chain does not cache on its own, so the last resolved
/// credentials are kept until [`REFRESH_BEFORE_EXPIRY`] ahead of their expiry.
/// Credentials without an expiry are kept for the life of the process.
#[derive(Clone, Debug)]
pub struct CredentialSource {
    provider: SharedCredentialsProvider,
    cached: Arc<Mutex<Option<Credentials>>>,
}

impl CredentialSource {
    pub fn from_provider(provider: SharedCredentialsProvider) -> Self {
        Self {
            provider,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_static(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self::from_provider(SharedCredentialsProvider::new(Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            STATIC_PROVIDER_NAME,
        )))
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            info!("Using static AWS credentials from configuration");
            return Ok(Self::from_static(
                access_key_id.clone(),
                secret_access_key.clone(),
                config.aws_session_token.clone(),
            ));
        }

        info!("Using the AWS default credential provider chain");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        sdk_config
            .credentials_provider()
            .map(Self::from_provider)
            .ok_or_else(|| {
                KbError::Credentials("no credential provider available".to_string())
            })
    }

    pub async fn resolve(&self) -> Result<Credentials> {
        // held across the provider call so concurrent callers share one refresh
        let mut cached = self.cached.lock().await;

        if let Some(credentials) = cached.as_ref() {
            if is_fresh(credentials, SystemTime::now()) {
                return Ok(credentials.clone());
            }
            debug!("Cached credentials are about to expire, refreshing");
        }

        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| KbError::Credentials(e.to_string()))?;
        debug!("Resolved credentials from provider chain");

        *cached = Some(credentials.clone());
        Ok(credentials)
    }
}

fn is_fresh(credentials: &Credentials, now: SystemTime) -> bool {
    match credentials.expiry() {
        None => true,
        Some(expiry) => expiry
            .duration_since(now)
            .is_ok_and(|left| left > REFRESH_BEFORE_EXPIRY),
    }
}

// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{KbError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_PRESIGNED_URL_EXPIRATION: u64 = 3600;
pub const DEFAULT_KNOWLEDGE_BASE_DESCRIPTION: &str = "a knowledge base";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Longest lifetime SigV4 accepts for a presigned URL (seven days).
pub const MAX_PRESIGNED_URL_EXPIRATION: u64 = 604_800;

const REDACTED: &str = "********";

/// Process configuration, read once at startup and shared read-only afterwards.
///
/// Field names match the environment variables the server reads
/// (`KNOWLEDGE_BASE_ID`, `AWS_REGION`, `MAX_RESULTS`, ...).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub knowledge_base_id: Option<String>,

    #[serde(default = "default_region")]
    pub aws_region: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Lifetime of generated source links, in seconds.
    #[serde(default = "default_presigned_url_expiration")]
    pub presigned_url_expiration: u64,

    /// Free text appended to the `retrieve` tool description.
    #[serde(default = "default_knowledge_base_description")]
    pub knowledge_base_description: String,

    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    #[serde(default)]
    pub aws_session_token: Option<String>,

    /// Overrides `https://bedrock-agent-runtime.{region}.amazonaws.com`.
    #[serde(default)]
    pub bedrock_endpoint: Option<String>,

    /// Overrides the S3 endpoint; links switch to path-style addressing.
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound for one Retrieve attempt, connect through response body.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retrieve attempts including the first; throttling, 5xx and
    /// connection failures are retried.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_mcp_host")]
    pub mcp_host: String,

    #[serde(default = "default_mcp_port")]
    pub mcp_port: u16,

    #[serde(default = "default_mcp_path")]
    pub mcp_path: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_presigned_url_expiration() -> u64 {
    DEFAULT_PRESIGNED_URL_EXPIRATION
}

fn default_knowledge_base_description() -> String {
    DEFAULT_KNOWLEDGE_BASE_DESCRIPTION.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_mcp_host() -> String {
    "0.0.0.0".to_string()
}

fn default_mcp_port() -> u16 {
    8000
}

fn default_mcp_path() -> String {
    "/mcp".to_string()
}

impl Config {
    /// Loads `.env`, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::from_sources(path, None)
    }

    /// Same layering as [`Config::load`] but with an injected environment,
    /// leaving the process environment untouched.
    pub fn from_env_map(
        path: Option<&Path>,
        env: config::Map<String, String>,
    ) -> Result<Self> {
        Self::from_sources(path, Some(env))
    }

    fn from_sources(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::default()
                .try_parsing(true)
                .source(env),
        );

        let settings = builder
            .build()
            .map_err(|e| KbError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| KbError::Config(e.to_string()))?;

        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            knowledge_base_id: None,
            aws_region: default_region(),
            max_results: DEFAULT_MAX_RESULTS,
            presigned_url_expiration: DEFAULT_PRESIGNED_URL_EXPIRATION,
            knowledge_base_description: default_knowledge_base_description(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            bedrock_endpoint: None,
            s3_endpoint: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mcp_host: default_mcp_host(),
            mcp_port: default_mcp_port(),
            mcp_path: default_mcp_path(),
        }
    }

    /// Static keys are only used when both halves are present.
    pub fn has_static_credentials(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Self {
        let hide = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        Self {
            aws_access_key_id: hide(&self.aws_access_key_id),
            aws_secret_access_key: hide(&self.aws_secret_access_key),
            aws_session_token: hide(&self.aws_session_token),
            ..self.clone()
        }
    }

    // Blank values from `.env` templates count as unset.
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.knowledge_base_id,
            &mut self.aws_access_key_id,
            &mut self.aws_secret_access_key,
            &mut self.aws_session_token,
            &mut self.bedrock_endpoint,
            &mut self.s3_endpoint,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(KbError::Config(
                "max_results must be greater than 0".to_string(),
            ));
        }

        if self.presigned_url_expiration == 0
            || self.presigned_url_expiration > MAX_PRESIGNED_URL_EXPIRATION
        {
            return Err(KbError::Config(format!(
                "presigned_url_expiration must be between 1 and {} seconds",
                MAX_PRESIGNED_URL_EXPIRATION
            )));
        }

        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(KbError::Config(
                "connect_timeout_secs and request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(KbError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.aws_region.trim().is_empty() {
            return Err(KbError::Config("aws_region must not be empty".to_string()));
        }

        if !self.mcp_path.starts_with('/') || self.mcp_path.len() < 2 {
            return Err(KbError::Config(format!(
                "mcp_path must start with '/' and name a sub-path, got {:?}",
                self.mcp_path
            )));
        }

        Ok(())
    }
}

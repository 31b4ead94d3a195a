// file: src/storage/mod.rs
// description: object storage links for retrieved sources
// reference: internal module structure

pub mod presign;
pub mod uri;

pub use presign::S3Presigner;
pub use uri::{S3_SCHEME, S3Uri};

use crate::error::Result;
use async_trait::async_trait;
use tracing::warn;

/// Turns an S3 object into a temporary HTTPS link.
#[async_trait]
pub trait LinkGenerator: Send + Sync {
    async fn presign(&self, uri: &S3Uri) -> Result<String>;
}

/// Link for `uri`, never failing.
///
/// Non-`s3://` and malformed URIs come back unchanged; backend failures come
/// back as `"Error generating presigned URL: {message}"`.
pub async fn generate_presigned_url(links: &dyn LinkGenerator, uri: &str) -> String {
    if !S3Uri::is_s3(uri) {
        return uri.to_string();
    }

    let parsed = match S3Uri::parse(uri) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Leaving source link unsigned: {}", e);
            return uri.to_string();
        }
    };

    match links.presign(&parsed).await {
        Ok(link) => link,
        Err(e) => {
            warn!("Presigning {} failed: {}", uri, e);
            format!("Error generating presigned URL: {}", e.detail())
        }
    }
}

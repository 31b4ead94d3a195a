// file: src/storage/uri.rs
// description: s3://bucket/key URI parsing
// reference: https://docs.aws.amazon.com/AmazonS3/latest/userguide/access-bucket-intro.html

use crate::error::{KbError, Result};
use std::fmt;

pub const S3_SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    pub fn is_s3(uri: &str) -> bool {
        uri.starts_with(S3_SCHEME)
    }

    /// Splits on the first `/` after the scheme. Bucket and key must both be non-empty.
    pub fn parse(uri: &str) -> Result<Self> {
        let path = uri
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| KbError::MalformedUri(uri.to_string()))?;

        match path.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(KbError::MalformedUri(uri.to_string())),
        }
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_nested_key() {
        let uri = S3Uri::parse("s3://my-bucket/docs/report.pdf").unwrap();
        assert_eq!(uri.bucket, "my-bucket");
        assert_eq!(uri.key, "docs/report.pdf");
        assert_eq!(uri.to_string(), "s3://my-bucket/docs/report.pdf");
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        for bad in ["s3://bucket-only", "s3://bucket/", "s3:///key", "https://x/y"] {
            assert!(
                matches!(S3Uri::parse(bad), Err(KbError::MalformedUri(_))),
                "{} should be rejected",
                bad
            );
        }
    }
}

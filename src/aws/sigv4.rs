// file: src/aws/sigv4.rs
// description: SigV4 header signing and query presigning on top of aws-sigv4
// reference: https://docs.rs/aws-sigv4

use crate::error::{KbError, Result};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    PercentEncodingMode, SignableBody, SignableRequest, SignatureLocation, SigningParams,
    SigningSettings, UriPathNormalizationMode, sign,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::{Duration, SystemTime};

// RFC 3986 unreserved characters stay literal.
const URI_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const PATH_ENCODE: &AsciiSet = &URI_ENCODE.remove(b'/');

pub fn uri_encode(value: &str) -> String {
    utf8_percent_encode(value, URI_ENCODE).to_string()
}

pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE).to_string()
}

fn signing_error(e: impl std::fmt::Display) -> KbError {
    KbError::Signing(e.to_string())
}

/// Region, service and clock for one signature.
#[derive(Debug, Clone, Copy)]
pub struct SigningScope<'a> {
    pub region: &'a str,
    pub service: &'a str,
    pub time: SystemTime,
}

impl<'a> SigningScope<'a> {
    pub fn new(region: &'a str, service: &'a str, time: SystemTime) -> Self {
        Self {
            region,
            service,
            time,
        }
    }

    pub fn now(region: &'a str, service: &'a str) -> Self {
        Self::new(region, service, SystemTime::now())
    }
}

/// Signs a request and returns the headers to add to it
/// (`authorization`, `x-amz-date`, and `x-amz-security-token` for session credentials).
///
/// `url` must already be percent-encoded; `headers` are signed along with `host`.
pub fn sign_request(
    credentials: &Credentials,
    scope: SigningScope<'_>,
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Result<Vec<(String, String)>> {
    let identity: Identity = credentials.clone().into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(scope.region)
        .name(scope.service)
        .time(scope.time)
        .settings(SigningSettings::default())
        .build()
        .map_err(signing_error)?
        .into();

    let signable = SignableRequest::new(
        method,
        url,
        headers.iter().copied(),
        SignableBody::Bytes(body),
    )
    .map_err(signing_error)?;

    let (instructions, _signature) = sign(signable, &params).map_err(signing_error)?.into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

/// Presigns a `GET` of `url` and returns it with the signed query string appended.
///
/// S3 rules apply: single percent-encoding, no path normalization, unsigned payload.
pub fn presign_get(
    credentials: &Credentials,
    scope: SigningScope<'_>,
    url: &str,
    expires_in: Duration,
) -> Result<String> {
    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(expires_in);
    settings.percent_encoding_mode = PercentEncodingMode::Single;
    settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;

    let identity: Identity = credentials.clone().into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(scope.region)
        .name(scope.service)
        .time(scope.time)
        .settings(settings)
        .build()
        .map_err(signing_error)?
        .into();

    let signable = SignableRequest::new(
        "GET",
        url,
        std::iter::empty(),
        SignableBody::UnsignedPayload,
    )
    .map_err(signing_error)?;

    let (instructions, _signature) = sign(signable, &params).map_err(signing_error)?.into_parts();

    let query = instructions
        .params()
        .iter()
        .map(|(name, value)| format!("{}={}", uri_encode(name), uri_encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{}?{}", url, query))
}

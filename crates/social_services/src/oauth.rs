//! OAuth 1.0a (RFC 5849) request signing with HMAC-SHA1.
//!
//! Only the protocol parameters are signed: the X API v2 takes a JSON body,
//! which is not part of the signature base string.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;

use crate::types::{PublishError, TwitterCredentials};

const NONCE_LEN: usize = 32;

/// Percent-encodes `value` per RFC 3986 (everything but `A-Z a-z 0-9 - . _ ~`)
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Builds the signature base string: `METHOD&encoded-url&encoded-sorted-params`
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// Signs a base string with `consumer_secret&token_secret` and returns it base64-encoded
pub fn sign(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, PublishError> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| PublishError::Signing(e.to_string()))?;
    mac.update(base_string.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Random alphanumeric nonce
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// `Authorization` header value for a request to `url`
pub fn authorization_header(
    method: &str,
    url: &str,
    credentials: &TwitterCredentials,
    nonce: &str,
    timestamp: i64,
) -> Result<String, PublishError> {
    let timestamp = timestamp.to_string();
    let mut params = vec![
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let base_string = signature_base_string(method, url, &params);
    let signature = sign(
        &base_string,
        &credentials.api_secret,
        &credentials.access_token_secret,
    )?;

    params.push(("oauth_signature", signature.as_str()));
    params.sort();

    let fields = params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}

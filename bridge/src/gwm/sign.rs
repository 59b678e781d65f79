//! Request signing for the gateway API
//!
//! Every request carries four auth headers: app key, millisecond
//! timestamp, nonce, and a SHA-256 signature over a canonical rendering
//! of the request. The gateway rejects requests whose signature does not
//! match its own rendering, so the canonicalization here has to be exact.

use std::time::{SystemTime, UNIX_EPOCH};

use md5::Md5;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::errors::BridgeError;

/// Unreserved characters stay bare; everything else is percent-encoded.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs gateway requests with a fixed app key/secret pair
#[derive(Debug, Clone)]
pub struct Signer {
    app_key: String,
    app_secret: String,
    auth_prefix: String,
}

impl Signer {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>, auth_prefix: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            auth_prefix: auth_prefix.into(),
        }
    }

    /// Produce the four auth headers for one request.
    ///
    /// A fresh nonce and timestamp are drawn per call; the signature is
    /// deterministic given those two.
    pub fn headers(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        params: Option<&[(String, String)]>,
    ) -> Result<Vec<(String, String)>, BridgeError> {
        let timestamp = now_millis();
        let nonce = generate_nonce();
        let signature = self.sign(method, url, body, params, &nonce, timestamp)?;

        Ok(vec![
            (format!("{}-auth-appkey", self.auth_prefix), self.app_key.clone()),
            (format!("{}-auth-timestamp", self.auth_prefix), timestamp.to_string()),
            (format!("{}-auth-sign", self.auth_prefix), signature),
            (format!("{}-auth-nonce", self.auth_prefix), nonce),
        ])
    }

    /// Compute the signature for fixed nonce and timestamp
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        params: Option<&[(String, String)]>,
        nonce: &str,
        timestamp_ms: i64,
    ) -> Result<String, BridgeError> {
        let url = Url::parse(url)?;

        let auth_string = format!(
            "{p}-auth-appkey:{key}{p}-auth-nonce:{nonce}{p}-auth-timestamp:{ts}",
            p = self.auth_prefix,
            key = self.app_key,
            nonce = nonce,
            ts = timestamp_ms,
        );

        let path_string = canonical_path(&url);
        let body_string = match params {
            Some(params) if method == "GET" => canonical_params(params),
            _ => canonical_body(method, &url, body),
        };

        let base = format!(
            "{}{}{}{}{}",
            method, path_string, auth_string, body_string, self.app_secret
        );
        let clean: String = base.chars().filter(|c| !c.is_whitespace()).collect();
        let encoded = utf8_percent_encode(&clean, ENCODE_SET).to_string();

        Ok(hex::encode(Sha256::digest(encoded.as_bytes())))
    }
}

/// Canonical path: segments rejoined with a single leading slash,
/// empty segments dropped.
fn canonical_path(url: &Url) -> String {
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Canonical parameter string: keys sorted case-insensitively ascending
/// (ties broken by the original key bytes), emitted as
/// `lowercased_key=original_value` joined by `&`. Repeated keys are all
/// emitted, in their input order.
fn canonical_params(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| (key.to_lowercase(), key.clone()));

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key.to_lowercase(), value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical body string: GET uses the parsed query string, POST wraps
/// the body as `json=<body>` with all whitespace stripped.
fn canonical_body(method: &str, url: &Url, body: Option<&str>) -> String {
    match (method, body) {
        ("GET", _) => {
            if url.query().unwrap_or_default().is_empty() {
                return String::new();
            }
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            canonical_params(&pairs)
        }
        ("POST", Some(body)) => {
            let with_prefix = format!("json={}", body);
            with_prefix.chars().filter(|c| !c.is_whitespace()).collect()
        }
        _ => String::new(),
    }
}

/// Generate a 16-character nonce from the current nanosecond time.
///
/// The MD5 hex digest is padded with random digits if it comes up short
/// and truncated to 16 characters.
pub fn generate_nonce() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut nonce = hex::encode(Md5::digest(nanos.to_string().as_bytes()));
    if nonce.len() < 16 {
        let padding: i64 = rand::thread_rng().gen_range(0..=i64::MAX);
        nonce.push_str(&padding.to_string());
    }
    nonce.truncate(16);
    nonce
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

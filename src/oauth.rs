// OAuth 1.0a request signing (HMAC-SHA1) as used by the note service's
// open API. Every request, including the token handshake itself, carries
// an `Authorization: OAuth ...` header built here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// A token/secret pair borrowed from either a temporary credential or
/// the long-lived access credentials.
#[derive(Debug, Clone, Copy)]
pub struct TokenRef<'a> {
    pub token: &'a str,
    pub secret: &'a str,
}

/// Signs requests on behalf of one registered application (the consumer).
#[derive(Debug, Clone)]
pub struct Signer {
    consumer_key: String,
    consumer_secret: String,
}

impl Signer {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Signer {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// `oauth_extra` holds protocol parameters such as `oauth_callback` or
    /// `oauth_verifier`; `params` holds query or url-encoded form
    /// parameters, which are signed but not placed in the header.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        token: Option<TokenRef<'_>>,
        oauth_extra: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.authorization_header_with(
            method,
            url,
            token,
            oauth_extra,
            params,
            &nonce,
            &timestamp.to_string(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        token: Option<TokenRef<'_>>,
        oauth_extra: &[(&str, &str)],
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, ApiError> {
        let mut oauth: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp),
            ("oauth_version", OAUTH_VERSION),
        ];
        if let Some(t) = token {
            oauth.push(("oauth_token", t.token));
        }
        oauth.extend_from_slice(oauth_extra);

        let mut all: Vec<(&str, &str)> = oauth.clone();
        all.extend_from_slice(params);
        let base = signature_base_string(method, url, &all);
        let signature = sign(&base, &self.consumer_secret, token.map(|t| t.secret).unwrap_or(""))?;

        oauth.push(("oauth_signature", signature.as_str()));
        let fields: Vec<String> = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

/// RFC 3986 percent-encoding: everything but `A-Za-z0-9-._~`.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `METHOD&url&params`, with parameters encoded then sorted by key and
/// value.
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();
    let normalized: Vec<String> = encoded
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&normalized.join("&"))
    )
}

/// Base64 HMAC-SHA1 of the base string keyed by `consumer&token` secrets.
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String, ApiError> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ApiError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Parse an `application/x-www-form-urlencoded` body such as the token
/// endpoints return.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = urlencoding::decode(&k.replace('+', " ")).ok()?.into_owned();
            let v = urlencoding::decode(&v.replace('+', " ")).ok()?.into_owned();
            Some((k, v))
        })
        .collect()
}

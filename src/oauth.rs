//! OAuth 1.0a request signing (HMAC-SHA1), as Tumblr expects it.
//!
//! Only the signing half of OAuth lives here. Obtaining the token and token
//! secret is left to whoever supplies the [`Credentials`].

use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::Credentials;
use crate::params::Params;
use crate::util::percent_encode;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

pub fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// RFC 5849 section 3.4.1: method, base URL and the normalized parameters,
/// each encoded and joined with `&`.
///
/// `url` must not carry a query string; its parameters belong in `params`.
pub fn signature_base_string<'a, I>(method: &str, url: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of `base_string`, keyed with both secrets.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(base_string.as_bytes());

    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Value for the `Authorization` header of a request with a fresh nonce and
/// the current time.
///
/// `params` are the query or form parameters sent along with the request.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &Params,
) -> String {
    authorization_header_with(credentials, method, url, params, &nonce(), timestamp())
}

pub fn authorization_header_with(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &Params,
    nonce: &str,
    timestamp: u64,
) -> String {
    let timestamp = timestamp.to_string();

    let oauth = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let base_string = signature_base_string(
        method,
        url,
        oauth
            .iter()
            .copied()
            .chain(params.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
    );
    let signature = sign(
        &base_string,
        &credentials.consumer_secret,
        &credentials.token_secret,
    );

    let fields = oauth
        .iter()
        .copied()
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
        .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

//! Credentials and the places they can be loaded from.
//!
//! The client only ever sees four opaque strings. Getting hold of the OAuth
//! token pair (the three-legged dance) happens outside this crate.
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use serde_derive::Deserialize;

use crate::error::{Error, Result};

pub const ENV_CONSUMER_KEY: &str = "TUMBLR_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "TUMBLR_CONSUMER_SECRET";
pub const ENV_OAUTH_TOKEN: &str = "TUMBLR_OAUTH_TOKEN";
pub const ENV_OAUTH_SECRET: &str = "TUMBLR_OAUTH_SECRET";

/// Consumer key/secret identify the application, token/secret the user it
/// acts for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

/// On-disk layout of a credentials file.
#[derive(Deserialize)]
struct CredentialsFile {
    consumer_key: String,
    consumer_secret: String,
    oauth_key: String,
    oauth_secret: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Credentials {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Reads a JSON object with `consumer_key`, `consumer_secret`,
    /// `oauth_key` and `oauth_secret`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading credentials from {}", path.display());

        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(raw).map_err(Error::CredentialsFile)?;

        Ok(Credentials::new(
            file.consumer_key,
            file.consumer_secret,
            file.oauth_key,
            file.oauth_secret,
        ))
    }

    /// Reads `TUMBLR_CONSUMER_KEY`, `TUMBLR_CONSUMER_SECRET`,
    /// `TUMBLR_OAUTH_TOKEN` and `TUMBLR_OAUTH_SECRET`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).ok_or_else(|| Error::Credentials(name.to_string()));

        Ok(Credentials::new(
            get(ENV_CONSUMER_KEY)?,
            get(ENV_CONSUMER_SECRET)?,
            get(ENV_OAUTH_TOKEN)?,
            get(ENV_OAUTH_SECRET)?,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

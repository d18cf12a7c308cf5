use std::io;

use thiserror::Error;

use crate::types::ErrorDetail;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a call against the Tumblr API can fail with.
///
/// Each error is scoped to the single call that produced it. Nothing is
/// retried or swallowed inside the client.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response: DNS, TLS, connection reset,
    /// redirect loop and the like.
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON shape `endpoint` expects.
    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    /// Tumblr answered with a non-2xx status.
    #[error("Tumblr returned {status} {msg}")]
    Api {
        status: u16,
        msg: String,
        errors: Vec<ErrorDetail>,
    },

    #[error("Invalid avatar size {0}, expected one of 16, 24, 30, 40, 48, 64, 96, 128, 512")]
    InvalidAvatarSize(u16),

    /// A credential source was missing a value.
    #[error("Missing credential: {0}")]
    Credentials(String),

    #[error("Failed to read credentials file. error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Failed to parse credentials file. error: {0}")]
    CredentialsFile(serde_json::Error),
}

impl Error {
    /// HTTP status attached to this error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

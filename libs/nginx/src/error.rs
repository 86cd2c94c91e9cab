//! Error types for the NGINX Plus client.

use thiserror::Error;

/// Errors talking to the NGINX Plus API.
#[derive(Debug, Error)]
pub enum NginxError {
    #[error("Invalid NGINX Plus API url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to connect to the NGINX Plus API at {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream {0} is not found")]
    UpstreamNotFound(String),

    #[error("Unexpected response from {url}: expected 200, got {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Error decoding upstream {upstream}: got {body:?} response: {source}")]
    Decode {
        upstream: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NginxError {
    /// Returns true if the error came from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

use thiserror::Error;

/// Errors returned by search service gateways
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway configuration error: {0}")]
    Config(String),

    #[error("Invalid index name '{0}'")]
    InvalidIndexName(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl GatewayError {
    pub fn status(method: &'static str, url: impl Into<String>, status: u16, body: String) -> Self {
        Self::Status {
            method,
            url: url.into(),
            status,
            body,
        }
    }
}

use std::time::Duration;
use thiserror::Error;

/// Connection-level failures of the push stream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("server url '{0}' cannot carry a path")]
    NotABase(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

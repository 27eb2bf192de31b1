use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the tune archive. None of these are retried.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not decode JSON from {url}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no `{path}` result set")]
    MissingResults { url: String, path: &'static str },

    #[error("result entry {key:?} is missing a required field")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid theme code {0:?}: expected four digits in 1-7")]
    InvalidThemeCode(String),
}

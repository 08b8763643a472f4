use crate::model::AccountId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Rate limit exceeded on {endpoint}, resets in {}s", .reset_in.as_secs())]
    RateLimited { endpoint: String, reset_in: Duration },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Account not found: {0}")]
    NotFound(String),
}

/// A level-2 lookup that failed for one sampled seed account.
#[derive(Debug, Error)]
#[error("Failed to fetch accounts followed by {seed_id}: {cause}")]
pub struct FetchError {
    pub seed_id: AccountId,
    #[source]
    pub cause: ApiError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Required configuration field '{0}' is missing or empty")]
    MissingField(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O on '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to encode tally: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("Failed to decode tally: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("'{0}' is not a cofollow checkpoint")]
    BadMagic(PathBuf),
    #[error("Unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report I/O on '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to write report row: {0}")]
    Csv(#[from] csv::Error),
}

/// Anything that aborts a run. Per-seed failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

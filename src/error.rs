use thiserror::Error;

use crate::hippius::{ACCESS_KEY_VAR, SECRET_KEY_VAR};

/// Everything that can make a single query fail.
///
/// Precondition errors (missing credentials or account) stop a whole branch of the run,
/// all other variants only abort the query that produced them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Set {} and {} environment variables", ACCESS_KEY_VAR, SECRET_KEY_VAR)]
    MissingCredentials,

    #[error("{flags} requires --account")]
    MissingAccount { flags: String },

    #[error("Connection Error: {0}")]
    Connection(String),

    #[error("HTTP Error: {code} - {reason}")]
    Status { code: u16, reason: String },

    #[error("Failed to parse API response")]
    Decode,

    #[error("RPC Error: {0}")]
    Rpc(String),

    #[error("RPC response carried no result")]
    MissingResult,

    #[error("Unexpected result for {method}: {detail}")]
    InvalidResult { method: String, detail: String },

    #[error("S3 request failed: {0}")]
    ObjectStore(String),
}

impl QueryError {
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::MissingAccount { .. })
    }

    pub fn invalid_result<M: Into<String>, D: ToString>(
        method: M,
        detail: D,
    ) -> Self {
        Self::InvalidResult {
            method: method.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Connection(String::from("request timed out"))
        } else {
            Self::Connection(err.without_url().to_string())
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

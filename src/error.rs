use thiserror::Error;

/// Failures surfaced by the API client. Every variant carries enough context
/// (field name, identifier, HTTP status) for the caller to act without
/// re-running with verbose tracing.
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// NerdGraph reported an error list; the HTTP status may still be 200.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The response decoded but did not match the expected nested structure.
    #[error("unexpected response shape: missing {key}")]
    Shape { key: &'static str },

    #[error("invalid GUID format: {0}")]
    InvalidGuid(String),

    #[error("{0}")]
    InvalidAccountId(String),

    #[error("{0}")]
    InvalidApiKey(String),

    #[error("{0}")]
    InvalidRegion(String),

    #[error("account ID required - run 'newrelic-cli config set-account-id' or set NEWRELIC_ACCOUNT_ID")]
    AccountIdRequired,

    #[error("empty time string")]
    EmptyTimeString,

    #[error("unable to parse time: {0}")]
    UnparseableTime(String),

    #[error("{0}")]
    NotFound(String),

    /// A lookup that should be unique returned multiple candidates.
    #[error("{0}")]
    Ambiguous(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Http { status: 404, .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

const UNKNOWN_STATUS_DESCRIPTION: &str = "Unknown Error";

#[derive(Debug, Error)]
pub enum Fin360Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("api rejected request: {0}")]
    Api(#[from] ApiError),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to read statement file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no access token set; authenticate first")]
    MissingAccessToken,

    #[error("invalid or unexpected response format")]
    InvalidResponse,
}

impl From<reqwest::Error> for Fin360Error {
    fn from(err: reqwest::Error) -> Self {
        Fin360Error::Transport(Box::new(err))
    }
}

/// Non-200 response from the Fin360 API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{description} ({status})")]
pub struct ApiError {
    pub status: u16,
    pub description: String,
}

impl ApiError {
    /// Build an error for `status`. An explicit `description` wins over the
    /// built-in status table.
    pub fn new(status: u16, description: Option<String>) -> Self {
        let description =
            description.unwrap_or_else(|| describe_status(status).to_string());
        Self {
            status,
            description,
        }
    }

    pub fn from_status(status: u16) -> Self {
        Self::new(status, None)
    }
}

/// Description the Fin360 API associates with a status code.
pub fn describe_status(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Invalid Access Token",
        403 => "Access Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => UNKNOWN_STATUS_DESCRIPTION,
    }
}

/// Local precondition failure; never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value:?}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
}

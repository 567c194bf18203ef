use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog responded with status {0}")]
    BadStatus(u16),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("problem not found: {0}")]
    ProblemNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

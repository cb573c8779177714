use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} -> {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("GitHub API error: {status} {status_text}")]
    Transport { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("Failed to write artifact {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

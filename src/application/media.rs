//! Port for copying remote media into local upload storage.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to fetch `{url}`: {message}")]
    Fetch { url: String, message: String },
    #[error("failed to store media from `{url}`: {message}")]
    Store { url: String, message: String },
}

#[async_trait]
pub trait MediaIngestor: Send + Sync {
    /// Fetch `remote_url`, store it, and return the url of the stored copy.
    async fn ingest(&self, remote_url: &str) -> Result<String, MediaError>;
}

//! Remote media ingestion over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tracing::info;
use url::Url;

use crate::application::media::{MediaError, MediaIngestor};
use crate::infra::uploads::UploadStorage;

const FALLBACK_NAME: &str = "media";

pub struct RemoteMediaIngestor {
    client: reqwest::Client,
    storage: Arc<UploadStorage>,
    max_bytes: usize,
}

impl RemoteMediaIngestor {
    pub fn new(
        storage: Arc<UploadStorage>,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            storage,
            max_bytes,
        })
    }
}

#[async_trait]
impl MediaIngestor for RemoteMediaIngestor {
    async fn ingest(&self, remote_url: &str) -> Result<String, MediaError> {
        let fetch_error = |message: String| MediaError::Fetch {
            url: remote_url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(remote_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| fetch_error(err.to_string()))?;

        let too_large = |size: u64| {
            fetch_error(format!(
                "{size} bytes exceeds the {} byte limit",
                self.max_bytes
            ))
        };
        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            return Err(too_large(length));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| fetch_error(err.to_string()))?
        {
            let received = body.len() + chunk.len();
            if received > self.max_bytes {
                return Err(too_large(received as u64));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        let stored = self
            .storage
            .store(&file_name_from_url(remote_url), bytes)
            .await
            .map_err(|err| MediaError::Store {
                url: remote_url.to_string(),
                message: err.to_string(),
            })?;

        info!(
            target = "folio::infra::media",
            remote = remote_url,
            stored_path = %stored.stored_path,
            size_bytes = stored.size_bytes,
            checksum = %stored.checksum,
            "Ingested remote media"
        );
        Ok(self.storage.public_url(&stored.stored_path))
    }
}

fn file_name_from_url(remote_url: &str) -> String {
    Url::parse(remote_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

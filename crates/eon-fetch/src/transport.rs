//! Transport seam between the retrieval pipeline and the outside world.

use std::io::ErrorKind as IoErrorKind;

use async_trait::async_trait;
use bytes::Bytes;
use eon_common::{EonError, EonResult};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::FetchConfig;
use crate::source::SourceRoot;

/// A completed request: any status, body only for successes.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }
}

/// Retrieves a single location.
///
/// Returns `Ok` for any response that arrived (including error statuses) and
/// `Err` only when no response was obtained at all.
#[async_trait]
pub trait AssetTransport: Send + Sync {
    async fn get(&self, location: &SourceRoot) -> EonResult<FetchResponse>;
}

/// reqwest for URLs, `tokio::fs` for local directories.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> EonResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| EonError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_url(&self, url: &reqwest::Url) -> EonResult<FetchResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| EonError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(FetchResponse::status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EonError::Transport(format!("{}: {}", url, e)))?;
        debug!(url = %url, bytes = body.len(), "Fetched");
        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl AssetTransport for HttpTransport {
    #[instrument(skip_all, fields(location = %location))]
    async fn get(&self, location: &SourceRoot) -> EonResult<FetchResponse> {
        match location {
            SourceRoot::Http(url) => self.get_url(url).await,
            SourceRoot::Directory(path) => match tokio::fs::read(path).await {
                Ok(data) => {
                    debug!(path = %path.display(), bytes = data.len(), "Read local file");
                    Ok(FetchResponse::ok(data))
                }
                // Local files behave like a static file server.
                Err(e) if e.kind() == IoErrorKind::NotFound => Ok(FetchResponse::status(404)),
                Err(e) if e.kind() == IoErrorKind::PermissionDenied => {
                    Ok(FetchResponse::status(403))
                }
                Err(e) => Err(EonError::Transport(format!("{}: {}", path.display(), e))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_file_found_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calib-20240101.csv"), b"location\n1\n").unwrap();
        let transport = HttpTransport::new(&FetchConfig::default()).unwrap();
        let root = SourceRoot::directory(dir.path());

        let found = transport.get(&root.join("calib-20240101.csv")).await.unwrap();
        assert_eq!(found.status, 200);
        assert_eq!(found.body.as_ref(), b"location\n1\n");

        let missing = transport.get(&root.join("fp-20240101.ecsv")).await.unwrap();
        assert_eq!(missing.status, 404);
        assert!(missing.body.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = FetchConfig {
            request_timeout_secs: 2,
            connect_timeout_secs: 1,
            ..FetchConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        // Port 9 on localhost is discard; nothing should be listening.
        let root = SourceRoot::parse("http://127.0.0.1:9/").unwrap();
        let result = transport.get(&root.join("x")).await;
        assert!(matches!(result, Err(EonError::Transport(_))));
    }
}

//! Ordered-fallback retrieval.

use std::sync::Arc;
use std::time::Instant;

use eon_common::{EonError, EonResult};
use eon_decode::{Decoder, ImageDecoder, ImageHandle, RawAsset};
use tracing::{debug, info, instrument, warn};

use crate::config::FetchConfig;
use crate::source::SourceRoot;
use crate::status::{http_status_error, is_success};
use crate::transport::{AssetTransport, HttpTransport};

/// Fetches named assets from an ordered list of candidate sources.
#[derive(Clone)]
pub struct RetrievalPipeline {
    transport: Arc<dyn AssetTransport>,
}

impl RetrievalPipeline {
    pub fn new(transport: Arc<dyn AssetTransport>) -> Self {
        Self { transport }
    }

    /// Pipeline over the default reqwest/local-file transport.
    pub fn http(config: &FetchConfig) -> EonResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Fetch `asset_name` from the first candidate that answers with a 2xx.
    ///
    /// `on_attempt` is called with the full location before each attempt.
    /// Candidates are never retried; after the last one fails the result is
    /// [`EonError::SourceExhausted`] carrying the last failure.
    #[instrument(skip(self, sources, on_attempt), fields(candidates = sources.len()))]
    pub async fn fetch_named_asset<F>(
        &self,
        sources: &[SourceRoot],
        asset_name: &str,
        mut on_attempt: F,
    ) -> EonResult<RawAsset>
    where
        F: FnMut(&SourceRoot) + Send,
    {
        let mut attempts = 0;
        let mut last = String::from("no candidate sources");

        for root in sources {
            let location = root.join(asset_name);
            attempts += 1;
            on_attempt(&location);

            let start = Instant::now();
            match self.transport.get(&location).await {
                Ok(response) if is_success(response.status) => {
                    info!(
                        location = %location,
                        bytes = response.body.len(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Fetched asset"
                    );
                    return Ok(RawAsset::new(location.to_string(), response.body));
                }
                Ok(response) => {
                    let err = http_status_error(&location.to_string(), response.status);
                    warn!(location = %location, status = response.status, "Candidate failed, trying next");
                    last = err.to_string();
                }
                Err(e) => {
                    warn!(location = %location, error = %e, "Candidate failed, trying next");
                    last = e.to_string();
                }
            }
        }

        debug!(attempts = attempts, "All candidates failed");
        Err(EonError::SourceExhausted {
            asset: asset_name.to_string(),
            attempts,
            last,
        })
    }

    /// Same search as [`fetch_named_asset`](Self::fetch_named_asset), with the
    /// payload validated as an image.
    pub async fn load_image_asset<F>(
        &self,
        sources: &[SourceRoot],
        asset_name: &str,
        on_attempt: F,
    ) -> EonResult<ImageHandle>
    where
        F: FnMut(&SourceRoot) + Send,
    {
        let raw = self.fetch_named_asset(sources, asset_name, on_attempt).await?;
        ImageDecoder::new().decode(&raw)
    }
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline").finish_non_exhaustive()
    }
}

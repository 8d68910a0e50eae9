//! Candidate fallback behaviour of the retrieval pipeline.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eon_common::{EonError, EonResult};
use eon_fetch::{AssetTransport, FetchConfig, FetchResponse, RetrievalPipeline, SourceRoot};
use test_utils::{jpeg, local_root_with_night, NIGHT};

/// Answers from a fixed table; unknown locations get a 404.
#[derive(Default)]
struct ScriptedTransport {
    responses: HashMap<String, EonResult<FetchResponse>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn respond(mut self, location: &str, response: EonResult<FetchResponse>) -> Self {
        self.responses.insert(location.to_string(), response);
        self
    }
}

#[async_trait]
impl AssetTransport for ScriptedTransport {
    async fn get(&self, location: &SourceRoot) -> EonResult<FetchResponse> {
        let key = location.to_string();
        self.requests.lock().unwrap().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(FetchResponse::status(404)))
    }
}

fn roots(locations: &[&str]) -> Vec<SourceRoot> {
    locations
        .iter()
        .map(|l| SourceRoot::parse(l).unwrap())
        .collect()
}

// ============================================================================
// Ordered fallback
// ============================================================================

#[tokio::test]
async fn test_third_candidate_succeeds_after_two_failures() {
    let transport = ScriptedTransport::default()
        .respond("https://a.test/n/fp.ecsv", Ok(FetchResponse::status(500)))
        .respond(
            "https://b.test/n/fp.ecsv",
            Err(EonError::Transport("connection reset".into())),
        )
        .respond("https://c.test/n/fp.ecsv", Ok(FetchResponse::ok("payload")));
    let transport = Arc::new(transport);
    let pipeline = RetrievalPipeline::new(transport.clone());

    let mut attempts = Vec::new();
    let asset = pipeline
        .fetch_named_asset(
            &roots(&["https://a.test/n/", "https://b.test/n", "https://c.test/n/"]),
            "fp.ecsv",
            |location| attempts.push(location.to_string()),
        )
        .await
        .unwrap();

    assert_eq!(asset.source, "https://c.test/n/fp.ecsv");
    assert_eq!(asset.body.as_ref(), b"payload");
    assert_eq!(
        attempts,
        vec![
            "https://a.test/n/fp.ecsv",
            "https://b.test/n/fp.ecsv",
            "https://c.test/n/fp.ecsv",
        ]
    );
    assert_eq!(*transport.requests.lock().unwrap(), attempts);
}

#[tokio::test]
async fn test_first_success_stops_the_search() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .respond("https://a.test/fp.ecsv", Ok(FetchResponse::ok("first"))),
    );
    let pipeline = RetrievalPipeline::new(transport.clone());

    let mut calls = 0;
    let asset = pipeline
        .fetch_named_asset(&roots(&["https://a.test/", "https://b.test/"]), "fp.ecsv", |_| {
            calls += 1
        })
        .await
        .unwrap();

    assert_eq!(asset.body.as_ref(), b"first");
    assert_eq!(calls, 1);
    assert_eq!(transport.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_all_candidates_fail() {
    let transport = ScriptedTransport::default()
        .respond("https://a.test/fp.ecsv", Ok(FetchResponse::status(503)));
    let pipeline = RetrievalPipeline::new(Arc::new(transport));

    let err = pipeline
        .fetch_named_asset(&roots(&["https://a.test/", "https://b.test/"]), "fp.ecsv", |_| {})
        .await
        .unwrap_err();

    match err {
        EonError::SourceExhausted {
            asset,
            attempts,
            last,
        } => {
            assert_eq!(asset, "fp.ecsv");
            assert_eq!(attempts, 2);
            assert_eq!(last, "https://b.test/fp.ecsv: Not Found");
        }
        other => panic!("expected SourceExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_image_asset_rejects_non_image() {
    let transport = ScriptedTransport::default()
        .respond("https://a.test/fvc.jpg", Ok(FetchResponse::ok("<html/>")));
    let pipeline = RetrievalPipeline::new(Arc::new(transport));
    let result = pipeline
        .load_image_asset(&roots(&["https://a.test/"]), "fvc.jpg", |_| {})
        .await;
    assert!(matches!(result, Err(EonError::Format(_))));
}

#[tokio::test]
async fn test_load_image_asset_success() {
    let transport = ScriptedTransport::default()
        .respond("https://a.test/fvc.jpg", Ok(FetchResponse::ok(jpeg(10, 6))));
    let pipeline = RetrievalPipeline::new(Arc::new(transport));
    let handle = pipeline
        .load_image_asset(&roots(&["https://a.test/"]), "fvc.jpg", |_| {})
        .await
        .unwrap();
    assert_eq!((handle.width, handle.height), (10, 6));
}

// ============================================================================
// Local directories
// ============================================================================

#[tokio::test]
async fn test_local_directory_fallback_to_second_root() {
    let empty = tempfile::tempdir().unwrap();
    let populated = local_root_with_night(NIGHT);
    let pipeline = RetrievalPipeline::http(&FetchConfig::default()).unwrap();

    let sources = vec![
        SourceRoot::directory(empty.path()).join(NIGHT),
        SourceRoot::directory(populated.path()).join(NIGHT),
    ];
    let mut attempts = 0;
    let asset = pipeline
        .fetch_named_asset(&sources, &format!("calib-{}.csv", NIGHT), |_| attempts += 1)
        .await
        .unwrap();

    assert_eq!(attempts, 2);
    assert!(asset.source.starts_with(&populated.path().display().to_string()));
    assert!(asset.body.starts_with(b"location,"));
}

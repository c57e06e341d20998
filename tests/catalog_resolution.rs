use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use packhorse::core::error::InstallerError;
use packhorse::core::http::build_http_client;
use packhorse::core::pack::CatalogClient;

fn catalog(server: &MockServer) -> CatalogClient {
    CatalogClient::new(build_http_client().unwrap()).with_base_url(server.uri())
}

fn refs(pairs: &[(u32, u32)]) -> BTreeMap<u32, u32> {
    pairs.iter().copied().collect()
}

fn file_meta(id: u32, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "downloadUrl": format!("https://example.invalid/{}", name),
        "fileName": name,
        "fileLength": 42,
    })
}

#[tokio::test]
async fn batch_accepts_only_exact_file_id_matches() {
    let server = MockServer::start().await;

    // Project 111's latest files do NOT include the requested id; project
    // 333's do. Only 333 may be resolved by the batch phase.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 111, "latestFiles": [file_meta(999, "newer.jar")]},
            {"id": 333, "latestFiles": [file_meta(3003, "hit.jar")]},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // 111 must fall through to an individual lookup.
    Mock::given(method("GET"))
        .and(path("/111/file/1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_meta(1001, "fallback.jar")))
        .expect(1)
        .mount(&server)
        .await;

    let resolution = catalog(&server)
        .resolve_files(&refs(&[(111, 1001), (333, 3003)]))
        .await;

    assert!(resolution.failures.is_empty());
    assert_eq!(resolution.files.len(), 2);

    let by_project: BTreeMap<u32, &str> = resolution
        .files
        .iter()
        .map(|f| (f.project_id, f.file_name.as_str()))
        .collect();
    assert_eq!(by_project[&111], "fallback.jar");
    assert_eq!(by_project[&333], "hit.jar");
}

#[tokio::test]
async fn every_reference_is_attempted_exactly_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "latestFiles": [file_meta(10, "one.jar")]},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    for (pid, fid, name) in [(2u32, 20u32, "two.jar"), (3, 30, "three.jar")] {
        Mock::given(method("GET"))
            .and(path(format!("/{}/file/{}", pid, fid)))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_meta(fid, name)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let resolution = catalog(&server)
        .resolve_files(&refs(&[(1, 10), (2, 20), (3, 30)]))
        .await;

    assert_eq!(resolution.files.len(), 3);
    assert!(resolution.failures.is_empty());
    // Mock expectations assert the exact request counts on drop.
}

#[tokio::test]
async fn fallback_failures_are_isolated_per_reference() {
    let server = MockServer::start().await;

    // Batch resolves nothing.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/1/file/10"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/file/20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_meta(20, "ok.jar")))
        .mount(&server)
        .await;

    let resolution = catalog(&server).resolve_files(&refs(&[(1, 10), (2, 20)])).await;

    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].file_name, "ok.jar");

    assert_eq!(resolution.failures.len(), 1);
    match &resolution.failures[0] {
        InstallerError::MetadataResolutionFailed {
            project_id, file_id, ..
        } => {
            assert_eq!(*project_id, 1);
            assert_eq!(*file_id, 10);
        }
        other => panic!("unexpected failure: {:?}", other),
    }
}

#[tokio::test]
async fn fallback_rejects_a_mismatched_file_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // Catalog answers with a different file than the one requested.
    Mock::given(method("GET"))
        .and(path("/7/file/70"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_meta(71, "wrong.jar")))
        .mount(&server)
        .await;

    let resolution = catalog(&server).resolve_files(&refs(&[(7, 70)])).await;

    assert!(resolution.files.is_empty());
    assert_eq!(resolution.failures.len(), 1);
}

#[tokio::test]
async fn a_failed_batch_request_degrades_to_per_file_lookups() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/5/file/50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_meta(50, "five.jar")))
        .mount(&server)
        .await;

    let resolution = catalog(&server).resolve_files(&refs(&[(5, 50)])).await;

    assert_eq!(resolution.files.len(), 1);
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn no_references_means_no_requests() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would return 404 and, more to the
    // point, resolve_files must not issue any.
    let resolution = catalog(&server).resolve_files(&BTreeMap::new()).await;
    assert!(resolution.files.is_empty());
    assert!(resolution.failures.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

//! Integration tests for the bounded image fetcher.

use std::time::Duration;

use homestream::images::{AssetFetcher, FetchJob};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn batch_returns_after_every_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/3.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.jpg$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"jpeg".to_vec())
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let jobs: Vec<FetchJob> = (0..7)
        .map(|i| {
            FetchJob::new(
                format!("{}/img/{i}.jpg", server.uri()),
                dir.path().join(format!("nested/{i}.jpg")),
            )
        })
        .collect();

    let fetcher = AssetFetcher::new(5).unwrap();
    let summary = fetcher.fetch_many(jobs).await;

    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.failed, 1);
    for i in (0..7).filter(|i| *i != 3) {
        let file = dir.path().join(format!("nested/{i}.jpg"));
        assert_eq!(std::fs::read(file).unwrap(), b"jpeg");
    }
    assert!(!dir.path().join("nested/3.jpg").exists());
    assert!(!dir.path().join("nested/3.jpg.part").exists());
}

#[tokio::test]
async fn unreachable_host_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = AssetFetcher::new(1).unwrap();
    let ok = fetcher
        .fetch_one("http://127.0.0.1:9/none.jpg", &dir.path().join("none.jpg"))
        .await;
    assert!(!ok);
    assert!(!dir.path().join("none.jpg").exists());
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let fetcher = AssetFetcher::new(5).unwrap();
    let summary = fetcher.fetch_many(Vec::new()).await;
    assert_eq!(summary.total(), 0);
}

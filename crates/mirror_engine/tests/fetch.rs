use std::time::Duration;

use mirror_engine::{FetchError, FetchSettings, JsonFetcher, ReqwestJsonFetcher};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetcher_parses_json_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(header("user-agent", "mirror-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {"pages": {}}})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestJsonFetcher::new(FetchSettings {
        user_agent: "mirror-test/1.0".to_string(),
        ..FetchSettings::default()
    });
    let url = format!("{}/api.php", server.uri());

    let value = fetcher.get_json(&url).await.expect("fetch ok");
    assert_eq!(value, json!({"query": {"pages": {}}}));
}

#[tokio::test]
async fn fetcher_fails_with_parse_error_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let fetcher = ReqwestJsonFetcher::new(FetchSettings::default());
    let err = fetcher.get_json(&server.uri()).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = ReqwestJsonFetcher::new(FetchSettings::default());
    let err = fetcher.get_json(&server.uri()).await.unwrap_err();
    assert_eq!(err, FetchError::HttpStatus(503));
}

#[tokio::test]
async fn fetcher_reports_transport_error_on_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestJsonFetcher::new(FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    });
    let err = fetcher.get_json(&server.uri()).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn fetcher_rejects_invalid_url() {
    let fetcher = ReqwestJsonFetcher::new(FetchSettings::default());
    let err = fetcher.get_json("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

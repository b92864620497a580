use std::fs;
use std::sync::{Mutex, Once};
use std::time::Duration;

use mirror_core::{ExtractRules, HarvestItem, HarvestSource, ItemOutcome, RunStats};
use mirror_engine::{
    DownloadSettings, FetchSettings, Orchestrator, ProgressSink, RunConfig, RunError, RunEvent,
    WikiQuery,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mirror_logging::initialize_for_tests);
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn api_body(server: &MockServer, names: &[&str]) -> Value {
    let pages: serde_json::Map<String, Value> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            (
                (idx + 1).to_string(),
                json!({
                    "title": format!("File:{name}.png"),
                    "imageinfo": [{"url": format!("{}/img/{name}.png", server.uri())}]
                }),
            )
        })
        .collect();
    json!({"batchcomplete": "", "query": {"pages": pages}})
}

async fn mount_api(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, name: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{name}.png")))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn image(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(format!("bytes of {name}").into_bytes(), "image/png")
}

fn run_config(server: &MockServer, temp: &TempDir) -> RunConfig {
    RunConfig {
        query: WikiQuery::new(format!("{}/w/api.php", server.uri()), "Gallery"),
        rules: ExtractRules::default(),
        fallback: Vec::new(),
        output_dir: temp.path().join("images"),
        manifest_path: temp.path().join("data").join("images.json"),
        deadline: None,
    }
}

fn orchestrator(config: RunConfig) -> Orchestrator {
    Orchestrator::with_reqwest(config, FetchSettings::default(), DownloadSettings::default())
}

fn manifest_json(config: &RunConfig) -> Value {
    serde_json::from_str(&fs::read_to_string(&config.manifest_path).unwrap()).unwrap()
}

#[tokio::test]
async fn second_run_skips_everything_and_rewrites_identical_manifest() {
    init_logging();
    let server = MockServer::start().await;
    let names = ["Alpha", "Beta", "Gamma"];
    mount_api(&server, ResponseTemplate::new(200).set_body_json(api_body(&server, &names))).await;
    for name in names {
        mount_image(&server, name, image(name), 1).await;
    }

    let temp = TempDir::new().unwrap();
    let config = run_config(&server, &temp);
    let orchestrator = orchestrator(config.clone());
    let sink = RecordingSink::default();

    let first = orchestrator.run(&sink).await.expect("first run");
    assert_eq!(
        first.stats,
        RunStats {
            downloaded: 3,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(
        fs::read(config.output_dir.join("Beta.png")).unwrap(),
        b"bytes of Beta"
    );
    let first_manifest = fs::read(&config.manifest_path).unwrap();

    let second = orchestrator.run(&sink).await.expect("second run");
    assert_eq!(
        second.stats,
        RunStats {
            downloaded: 0,
            skipped: 3,
            failed: 0
        }
    );
    assert_eq!(fs::read(&config.manifest_path).unwrap(), first_manifest);
    assert_eq!(
        manifest_json(&config),
        json!([
            {"name": "Alpha", "filename": "Alpha.png"},
            {"name": "Beta", "filename": "Beta.png"},
            {"name": "Gamma", "filename": "Gamma.png"}
        ])
    );
}

#[tokio::test]
async fn failed_harvest_uses_fallback_list() {
    init_logging();
    let server = MockServer::start().await;
    mount_api(&server, ResponseTemplate::new(502)).await;
    mount_image(&server, "Akira", image("Akira"), 1).await;

    let temp = TempDir::new().unwrap();
    let mut config = run_config(&server, &temp);
    config.fallback = vec![HarvestItem::new(
        "Akira",
        "Akira.png",
        Some(&format!("{}/img/Akira.png", server.uri())),
    )];
    let sink = RecordingSink::default();

    let report = orchestrator(config.clone()).run(&sink).await.expect("run ok");

    assert_eq!(report.source, HarvestSource::Fallback);
    assert!(report.harvest_error.unwrap().contains("http status 502"));
    assert_eq!(report.stats.downloaded, 1);
    assert_eq!(
        manifest_json(&config),
        json!([{"name": "Akira", "filename": "Akira.png"}])
    );

    let events = sink.take();
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::HarvestFailed { .. })));
    assert!(events.contains(&RunEvent::ItemsResolved {
        count: 1,
        source: HarvestSource::Fallback
    }));
}

#[tokio::test]
async fn failed_harvest_without_fallback_is_fatal() {
    init_logging();
    let server = MockServer::start().await;
    mount_api(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

    let temp = TempDir::new().unwrap();
    let config = run_config(&server, &temp);

    let err = orchestrator(config.clone())
        .run(&RecordingSink::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::HarvestUnavailable(_)), "got {err:?}");
    assert!(!config.manifest_path.exists());
}

#[tokio::test]
async fn empty_harvest_does_not_fall_back() {
    init_logging();
    let server = MockServer::start().await;
    mount_api(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"batchcomplete": ""})),
    )
    .await;

    let temp = TempDir::new().unwrap();
    let mut config = run_config(&server, &temp);
    config.fallback = vec![HarvestItem::new("Unused", "Unused.png", Some("https://x/u.png"))];

    let report = orchestrator(config.clone())
        .run(&RecordingSink::default())
        .await
        .expect("run ok");
    assert_eq!(report.source, HarvestSource::Remote);
    assert_eq!(report.stats.total(), 0);
    assert_eq!(fs::read_to_string(&config.manifest_path).unwrap(), "[]\n");
}

#[tokio::test]
async fn one_failed_download_does_not_stop_the_run() {
    init_logging();
    let server = MockServer::start().await;
    let names = ["A", "B", "C", "D", "E"];
    mount_api(&server, ResponseTemplate::new(200).set_body_json(api_body(&server, &names))).await;
    for name in names {
        let response = if name == "C" {
            ResponseTemplate::new(500)
        } else {
            image(name)
        };
        mount_image(&server, name, response, 1).await;
    }

    let temp = TempDir::new().unwrap();
    let config = run_config(&server, &temp);
    let sink = RecordingSink::default();

    let report = orchestrator(config.clone()).run(&sink).await.expect("run ok");

    assert_eq!(
        report.stats,
        RunStats {
            downloaded: 4,
            skipped: 0,
            failed: 1
        }
    );
    assert!(matches!(&report.outcomes[2], ItemOutcome::Failed(msg) if msg.contains("500")));
    assert!(!config.output_dir.join("C.png").exists());

    let manifest = manifest_json(&config);
    let filenames: Vec<_> = manifest
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["filename"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(filenames, vec!["A.png", "B.png", "C.png", "D.png", "E.png"]);

    let finished = sink
        .take()
        .into_iter()
        .filter(|e| matches!(e, RunEvent::ItemFinished { .. }))
        .count();
    assert_eq!(finished, 5);
}

#[tokio::test]
async fn rerun_retries_only_missing_items() {
    init_logging();
    let server = MockServer::start().await;
    let names = ["A", "B"];
    mount_api(&server, ResponseTemplate::new(200).set_body_json(api_body(&server, &names))).await;
    mount_image(&server, "A", image("A"), 0).await;
    mount_image(&server, "B", image("B"), 1).await;

    let temp = TempDir::new().unwrap();
    let config = run_config(&server, &temp);
    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(config.output_dir.join("A.png"), b"from last run").unwrap();

    let report = orchestrator(config.clone())
        .run(&RecordingSink::default())
        .await
        .expect("run ok");
    assert_eq!(report.outcomes, vec![ItemOutcome::Skipped, ItemOutcome::Downloaded]);
    assert_eq!(
        fs::read(config.output_dir.join("A.png")).unwrap(),
        b"from last run"
    );
}

#[tokio::test]
async fn deadline_cuts_mirroring_short_but_writes_manifest() {
    init_logging();
    let server = MockServer::start().await;
    let names = ["Slow", "Later"];
    mount_api(&server, ResponseTemplate::new(200).set_body_json(api_body(&server, &names))).await;
    Mock::given(method("GET"))
        .and(path("/img/Later.png"))
        .respond_with(image("Later").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    mount_image(&server, "Slow", image("Slow"), 0).await;

    let temp = TempDir::new().unwrap();
    let mut config = run_config(&server, &temp);
    config.deadline = Some(Duration::from_millis(500));

    let report = orchestrator(config.clone())
        .run(&RecordingSink::default())
        .await
        .expect("run ok");

    assert_eq!(report.stats.failed, 2);
    assert_eq!(manifest_json(&config).as_array().unwrap().len(), 2);
    assert!(!config.output_dir.join("Later.png").exists());
}

#[tokio::test]
async fn unusable_output_dir_fails_before_any_request() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let mut config = run_config(&server, &temp);
    fs::write(temp.path().join("blocker"), b"x").unwrap();
    config.output_dir = temp.path().join("blocker");

    let err = orchestrator(config)
        .run(&RecordingSink::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::OutputDir(_)));
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jmr_core::api::client::ApiClient;
use jmr_core::api::types::DownloadProgress;
use jmr_core::error::{ApiError, MonitorError};
use jmr_core::monitor::observer::DownloadObserver;
use jmr_core::monitor::poller::{DownloadMonitor, MonitorConfig, MonitorOutcome};

const TASK_ID: &str = "350234_20260815120000";

/// Short enough to keep these tests fast, long enough for wiremock to keep
/// up comfortably.
fn quick_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval: Duration::from_millis(25),
        refresh_delay: Duration::from_millis(10),
        max_retries: 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Progress(f64),
    Complete,
    Error(String),
    Refresh,
}

/// Collects the observer callbacks these tests assert on.
struct CollectingObserver {
    seen: Arc<Mutex<Vec<Seen>>>,
}

#[async_trait]
impl DownloadObserver for CollectingObserver {
    async fn on_progress(&self, progress: &DownloadProgress) {
        self.seen.lock().unwrap().push(Seen::Progress(progress.progress));
    }

    async fn on_complete(&self, _progress: &DownloadProgress) {
        self.seen.lock().unwrap().push(Seen::Complete);
    }

    async fn on_error(&self, error: &str) {
        self.seen.lock().unwrap().push(Seen::Error(error.to_string()));
    }

    async fn on_refresh(&self) {
        self.seen.lock().unwrap().push(Seen::Refresh);
    }
}

fn monitor_for(server_url: &str, config: MonitorConfig) -> (DownloadMonitor, Arc<Mutex<Vec<Seen>>>) {
    let client = Arc::new(ApiClient::new(format!("{}/api", server_url)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut monitor = DownloadMonitor::with_config(client, config);
    monitor.add_observer(Box::new(CollectingObserver { seen: seen.clone() }));
    (monitor, seen)
}

fn progress_body(status: &str, progress: f64, message: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": {"status": status, "progress": progress, "message": message}
    })
}

#[tokio::test]
async fn test_monitor_end_to_end_completes_against_http_backend() {
    let server = MockServer::start().await;
    let progress_path = format!("/api/download/progress/{}", TASK_ID);

    // First two polls see an active download, every later one completion.
    Mock::given(method("GET"))
        .and(path(progress_path.clone()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(progress_body("running", 45.0, "正在下载漫画图片...")),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(progress_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(progress_body("completed", 100.0, "下载完成")),
        )
        .mount(&server)
        .await;

    let (monitor, seen) = monitor_for(&server.uri(), quick_config());
    let outcome = monitor.start(TASK_ID).join().await;

    assert!(outcome.is_completed());
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        3,
        "two running polls and one completed poll"
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Seen::Progress(45.0),
            Seen::Progress(45.0),
            Seen::Complete,
            Seen::Refresh,
        ]
    );
}

#[tokio::test]
async fn test_monitor_halts_when_backend_loses_the_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/download/progress/{}", TASK_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "下载任务不存在"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (monitor, seen) = monitor_for(&server.uri(), quick_config());
    let outcome = monitor.start(TASK_ID).join().await;

    assert!(matches!(
        outcome,
        MonitorOutcome::Failed(MonitorError::Poll(ApiError::Backend(_)))
    ));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Seen::Error(message) => assert!(message.contains("下载任务不存在")),
        other => panic!("expected an error callback, got {:?}", other),
    }
}

#[tokio::test]
async fn test_monitor_unreachable_server_is_a_transport_failure() {
    let client = Arc::new(ApiClient::new("http://127.0.0.1:1/api"));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut monitor = DownloadMonitor::with_config(client, quick_config());
    monitor.add_observer(Box::new(CollectingObserver { seen: seen.clone() }));

    let outcome = monitor.start(TASK_ID).join().await;

    assert!(
        matches!(
            outcome,
            MonitorOutcome::Failed(MonitorError::Poll(ApiError::Transport(_)))
        ),
        "polling an unreachable host should fail on the first attempt"
    );
    assert_eq!(seen.lock().unwrap().len(), 1, "one error callback, then silence");
}

#[tokio::test]
async fn test_monitor_stop_ends_http_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/download/progress/{}", TASK_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(progress_body("running", 10.0, "正在下载漫画图片...")),
        )
        .mount(&server)
        .await;

    let (monitor, _seen) = monitor_for(&server.uri(), quick_config());
    let handle = monitor.start(TASK_ID);

    // Let a few polls happen, then stop.
    tokio::time::sleep(Duration::from_millis(80)).await;
    handle.stop();
    let outcome = handle.join().await;
    assert!(matches!(outcome, MonitorOutcome::Cancelled));

    let polls_at_stop = server.received_requests().await.unwrap().len();
    assert!(polls_at_stop >= 1, "at least one poll should have happened");

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        polls_at_stop,
        "no further requests after stop"
    );
}

#[tokio::test]
async fn test_monitor_retry_budget_survives_flaky_http_backend() {
    let server = MockServer::start().await;
    let progress_path = format!("/api/download/progress/{}", TASK_ID);

    // One 502, then completion.
    Mock::given(method("GET"))
        .and(path(progress_path.clone()))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(progress_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(progress_body("completed", 100.0, "下载完成")),
        )
        .mount(&server)
        .await;

    let config = MonitorConfig {
        max_retries: 2,
        ..quick_config()
    };
    let (monitor, seen) = monitor_for(&server.uri(), config);
    let outcome = monitor.start(TASK_ID).join().await;

    assert!(outcome.is_completed());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Seen::Complete, Seen::Refresh],
        "the failed poll is retried silently"
    );
}

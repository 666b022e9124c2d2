//! End-to-end workflow tests: the controller drives real requests against a
//! wiremock server and the resulting state is checked after each step.

use image_processor_client::api::ProcessorClient;
use image_processor_client::app::{ActivityStatus, Command, Controller, Operation};
use image_processor_client::config::AppConfig;
use image_processor_client::notify::ToastKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

struct Harness {
    server: MockServer,
    runtime: Runtime,
    download_dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self {
            server,
            runtime,
            download_dir: tempfile::tempdir().unwrap(),
        }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn controller(&self) -> Controller {
        self.controller_with_timeout(Duration::from_secs(60))
    }

    fn controller_with_timeout(&self, timeout: Duration) -> Controller {
        let config = AppConfig {
            base_url: self.server.uri(),
            download_dir: self.download_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let client = ProcessorClient::new(&self.server.uri(), timeout).unwrap();
        Controller::new(config, client, self.runtime.handle().clone())
    }
}

fn image_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"image bytes").unwrap();
    path
}

fn ok_ack() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"info": "ok"}))
}

#[test]
fn test_start_loads_latest_batch() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folder": "run_42",
                "files": ["a.png", "b.png"]
            })))
            .expect(1),
    );
    let mut controller = harness.controller();

    controller.start();
    assert!(controller.state().is_busy(Operation::FetchLatest));
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    let batch = &controller.state().latest_batch;
    assert_eq!(batch.folder.as_deref(), Some("run_42"));
    assert_eq!(batch.files, vec!["a.png", "b.png"]);
}

#[test]
fn test_upload_then_delete() {
    let harness = Harness::new();
    harness.mount(Mock::given(method("POST")).and(path("/upload/")).respond_with(ok_ack()));
    harness.mount(
        Mock::given(method("DELETE"))
            .and(path("/delete/cat.png"))
            .respond_with(ok_ack()),
    );
    let images = tempfile::tempdir().unwrap();
    let mut controller = harness.controller();

    controller.dispatch(Command::Upload(image_file(images.path(), "cat.png")));
    assert!(controller.state().is_busy(Operation::Upload));
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));
    assert_eq!(controller.state().uploaded_files, vec!["cat.png"]);

    controller.dispatch(Command::Delete("cat.png".to_string()));
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));
    assert!(controller.state().uploaded_files.is_empty());
}

#[test]
fn test_failed_upload_adds_nothing_and_clears_flag() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ResponseTemplate::new(500)),
    );
    let images = tempfile::tempdir().unwrap();
    let mut controller = harness.controller();

    controller.dispatch(Command::Upload(image_file(images.path(), "cat.png")));
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    let state = controller.state();
    assert!(state.uploaded_files.is_empty());
    assert!(!state.is_busy(Operation::Upload));
    let toasts = state.notifications.visible();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
}

#[test]
fn test_unsupported_file_is_never_sent() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ok_ack())
            .expect(0),
    );
    let images = tempfile::tempdir().unwrap();
    let mut controller = harness.controller();

    controller.dispatch(Command::Upload(image_file(images.path(), "notes.txt")));

    let state = controller.state();
    assert!(!state.any_busy());
    assert!(state.uploaded_files.is_empty());
    assert_eq!(
        state.activity[0].status,
        ActivityStatus::Error("unsupported file type".to_string())
    );
}

#[test]
fn test_process_refreshes_latest_batch() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/process/"))
            .respond_with(ok_ack())
            .expect(1),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folder": "run_42",
                "files": ["a.png", "b.png"]
            })))
            .expect(1),
    );
    let mut controller = harness.controller();

    controller.dispatch(Command::Process);
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    let batch = &controller.state().latest_batch;
    assert_eq!(batch.folder.as_deref(), Some("run_42"));
    assert_eq!(batch.files, vec!["a.png", "b.png"]);
}

#[test]
fn test_failed_process_does_not_refresh() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/process/"))
            .respond_with(ResponseTemplate::new(500)),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );
    let mut controller = harness.controller();

    controller.dispatch(Command::Process);
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    assert!(controller.state().latest_batch.is_empty());
    assert!(!controller.state().any_busy());
}

#[test]
fn test_process_timeout_is_reported_as_failure() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/process/"))
            .respond_with(ok_ack().set_delay(Duration::from_secs(2))),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );
    let mut controller = harness.controller_with_timeout(Duration::from_millis(200));

    controller.dispatch(Command::Process);
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    let state = controller.state();
    assert!(!state.is_busy(Operation::Process));
    let toasts = state.notifications.visible();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert!(toasts[0].message.starts_with("Process failed"));
}

#[test]
fn test_refresh_replaces_previous_batch() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folder": "run_7",
                "files": ["x.png"]
            })))
            .up_to_n_times(1),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folder": "run_8",
                "files": []
            }))),
    );
    let mut controller = harness.controller();

    controller.dispatch(Command::RefreshLatest);
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));
    assert_eq!(controller.state().latest_batch.folder.as_deref(), Some("run_7"));

    controller.dispatch(Command::RefreshLatest);
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));
    assert_eq!(controller.state().latest_batch.folder.as_deref(), Some("run_8"));
    assert!(controller.state().latest_batch.files.is_empty());
}

#[test]
fn test_overlapping_operations_all_settle() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ok_ack().set_delay(Duration::from_millis(200))),
    );
    harness.mount(
        Mock::given(method("DELETE"))
            .and(path("/delete/old.png"))
            .respond_with(ResponseTemplate::new(500)),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folder": "run_1",
                "files": ["a.png"]
            }))),
    );
    let images = tempfile::tempdir().unwrap();
    let mut controller = harness.controller();

    controller.dispatch(Command::Upload(image_file(images.path(), "cat.png")));
    controller.dispatch(Command::Delete("old.png".to_string()));
    controller.dispatch(Command::RefreshLatest);
    assert!(controller.state().is_busy(Operation::Upload));
    assert!(controller.state().is_busy(Operation::Delete));
    assert!(controller.state().is_busy(Operation::FetchLatest));

    assert!(controller.poll_until_idle(IDLE_TIMEOUT));
    let state = controller.state();
    assert!(!state.is_busy(Operation::Upload));
    assert!(!state.is_busy(Operation::Delete));
    assert!(!state.is_busy(Operation::FetchLatest));
    assert_eq!(state.uploaded_files, vec!["cat.png"]);
    assert_eq!(state.latest_batch.folder.as_deref(), Some("run_1"));
}

#[test]
fn test_download_all_and_single_file() {
    let harness = Harness::new();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/download-latest-pros/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK zip".to_vec())),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/processed/run_42/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a".to_vec())),
    );
    let mut controller = harness.controller();
    let archive = harness.download_dir.path().join("run_42.zip");

    controller.dispatch(Command::DownloadAll(archive.clone()));
    controller.dispatch(Command::DownloadFile {
        folder: "run_42".to_string(),
        file: "a.png".to_string(),
    });
    assert!(controller.poll_until_idle(IDLE_TIMEOUT));

    assert_eq!(std::fs::read(&archive).unwrap(), b"PK zip");
    assert_eq!(
        std::fs::read(harness.download_dir.path().join("a.png")).unwrap(),
        b"a"
    );
    let successes = controller
        .state()
        .notifications
        .visible()
        .iter()
        .filter(|t| t.kind == ToastKind::Success)
        .count();
    assert_eq!(successes, 2);
}

use super::state::{AppState, FollowUp, Operation, Outcome};
use crate::api::ProcessorClient;
use crate::config::AppConfig;
use eframe::egui;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self as std_mpsc, Receiver, Sender};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// A user action that results in a request to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Delete(String),
    Process,
    RefreshLatest,
    /// Save the latest batch archive to the given path.
    DownloadAll(PathBuf),
    DownloadFile { folder: String, file: String },
}

/// Runs requests on the tokio runtime and feeds their outcomes into [`AppState`].
///
/// Request tasks never touch the state directly: each sends one [`Outcome`]
/// through a channel which [`Controller::poll`] drains on the UI thread.
pub struct Controller {
    config: AppConfig,
    client: ProcessorClient,
    handle: Handle,
    state: AppState,
    sender: Sender<Outcome>,
    receiver: Receiver<Outcome>,
    repaint: Option<egui::Context>,
}

impl Controller {
    pub fn new(config: AppConfig, client: ProcessorClient, handle: Handle) -> Self {
        let (sender, receiver) = std_mpsc::channel();
        Self {
            state: AppState::new(config.toast_duration()),
            config,
            client,
            handle,
            sender,
            receiver,
            repaint: None,
        }
    }

    /// Wakes the UI whenever an outcome arrives.
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    /// Start-up work: loads the latest processed batch.
    pub fn start(&mut self) {
        info!(base_url = %self.client.base_url(), "loading latest batch");
        self.dispatch(Command::RefreshLatest);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &ProcessorClient {
        &self.client
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Upload(path) => self.upload(path),
            Command::Delete(file_name) => {
                info!(file_name = %file_name, "deleting uploaded file");
                self.state.begin(Operation::Delete);
                let client = self.client.clone();
                self.spawn(async move {
                    let result = client.delete_file(&file_name).await;
                    Outcome::Deleted { file_name, result }
                });
            }
            Command::Process => {
                info!("triggering processing");
                self.state.begin(Operation::Process);
                let client = self.client.clone();
                self.spawn(async move { Outcome::Processed(client.process().await) });
            }
            Command::RefreshLatest => {
                self.state.begin(Operation::FetchLatest);
                let client = self.client.clone();
                self.spawn(async move { Outcome::LatestLoaded(client.latest_batch().await) });
            }
            Command::DownloadAll(dest) => {
                info!(dest = %dest.display(), "downloading latest batch archive");
                self.state.begin(Operation::DownloadAll);
                let client = self.client.clone();
                self.spawn(async move {
                    Outcome::ArchiveSaved(client.save_latest_archive(&dest).await)
                });
            }
            Command::DownloadFile { folder, file } => {
                info!(folder = %folder, file = %file, "downloading processed file");
                self.state.begin(Operation::DownloadFile);
                let client = self.client.clone();
                let dir = self.config.download_dir.clone();
                self.spawn(async move {
                    let result = client.save_processed_file(&folder, &file, &dir).await;
                    Outcome::FileSaved {
                        file_name: file,
                        result,
                    }
                });
            }
        }
    }

    fn upload(&mut self, path: PathBuf) {
        let file_name = display_name(&path);
        if !self.config.accepts(&file_name) {
            self.state
                .reject(Operation::Upload, &file_name, "unsupported file type");
            return;
        }

        info!(file_name = %file_name, "uploading file");
        self.state.begin(Operation::Upload);
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.upload_file(&path).await;
            Outcome::Uploaded { file_name, result }
        });
    }

    /// Applies every outcome received so far, starting follow-up requests.
    ///
    /// Returns the number of outcomes applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.receiver.try_recv() {
            applied += 1;
            if let Some(FollowUp::RefreshLatest) = self.state.apply(outcome) {
                self.dispatch(Command::RefreshLatest);
            }
        }
        applied
    }

    /// Polls until no request is outstanding or `timeout` elapses.
    ///
    /// Returns `true` when the controller went idle.
    pub fn poll_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if !self.state.any_busy() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        self.handle.spawn(async move {
            let outcome = request.await;
            if sender.send(outcome).is_err() {
                warn!("outcome dropped, UI has shut down");
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

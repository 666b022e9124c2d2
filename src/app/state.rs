use crate::api::{Ack, ApiError, LatestBatch, SavedFile};
use crate::notify::Notifications;
use crate::utils::file_size::format_size;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

/// Oldest activity entries are dropped past this many.
pub const MAX_ACTIVITY: usize = 200;

/// Every kind of request the client can have outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Delete,
    Process,
    FetchLatest,
    DownloadAll,
    DownloadFile,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Upload => "Upload",
            Operation::Delete => "Delete",
            Operation::Process => "Process",
            Operation::FetchLatest => "Refresh",
            Operation::DownloadAll => "Download",
            Operation::DownloadFile => "Download",
        }
    }
}

/// Message a request task sends back to the UI thread when it finishes.
#[derive(Debug)]
pub enum Outcome {
    Uploaded {
        file_name: String,
        result: Result<Ack, ApiError>,
    },
    Deleted {
        file_name: String,
        result: Result<Ack, ApiError>,
    },
    Processed(Result<Ack, ApiError>),
    LatestLoaded(Result<LatestBatch, ApiError>),
    ArchiveSaved(Result<SavedFile, ApiError>),
    FileSaved {
        file_name: String,
        result: Result<SavedFile, ApiError>,
    },
}

impl Outcome {
    pub fn operation(&self) -> Operation {
        match self {
            Outcome::Uploaded { .. } => Operation::Upload,
            Outcome::Deleted { .. } => Operation::Delete,
            Outcome::Processed(_) => Operation::Process,
            Outcome::LatestLoaded(_) => Operation::FetchLatest,
            Outcome::ArchiveSaved(_) => Operation::DownloadAll,
            Outcome::FileSaved { .. } => Operation::DownloadFile,
        }
    }
}

/// Work the controller must start after an outcome has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    RefreshLatest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityStatus {
    Success,
    Error(String),
}

/// One line of the activity log shown under "Show Details".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub operation: Operation,
    pub subject: String,
    pub status: ActivityStatus,
}

/// Outstanding request count per operation.
///
/// Each operation has its own counter, so overlapping requests of different
/// kinds never clear each other's loading flag.
#[derive(Debug, Default)]
pub struct InFlight {
    counts: HashMap<Operation, usize>,
}

impl InFlight {
    pub fn begin(&mut self, op: Operation) {
        *self.counts.entry(op).or_insert(0) += 1;
    }

    pub fn finish(&mut self, op: Operation) {
        if let Some(count) = self.counts.get_mut(&op) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&op);
            }
        }
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.counts.get(&op).copied().unwrap_or(0) > 0
    }

    pub fn any_busy(&self) -> bool {
        !self.counts.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub uploaded_files: Vec<String>,
    pub latest_batch: LatestBatch,
    pub notifications: Notifications,
    pub activity: Vec<Activity>,
    pub show_details: bool,
    in_flight: InFlight,
}

impl AppState {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            notifications: Notifications::new(toast_duration),
            ..Self::default()
        }
    }

    pub fn begin(&mut self, op: Operation) {
        self.in_flight.begin(op);
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.in_flight.is_busy(op)
    }

    pub fn any_busy(&self) -> bool {
        self.in_flight.any_busy()
    }

    /// Records a request that was refused before being sent.
    pub fn reject(&mut self, op: Operation, subject: &str, reason: &str) {
        error!(operation = ?op, subject, reason, "request rejected");
        self.notifications
            .error(format!("{} failed: {}", op.label(), reason));
        self.record(op, subject, ActivityStatus::Error(reason.to_string()));
    }

    /// Applies a finished request to the state and clears its loading flag.
    pub fn apply(&mut self, outcome: Outcome) -> Option<FollowUp> {
        let op = outcome.operation();
        self.in_flight.finish(op);

        match outcome {
            Outcome::Uploaded { file_name, result } => match result {
                Ok(ack) => {
                    info!(file_name = %file_name, "upload succeeded");
                    self.notifications
                        .success(ack_message(&ack, &format!("Uploaded {}", file_name)));
                    self.record(op, &file_name, ActivityStatus::Success);
                    self.uploaded_files.push(file_name);
                }
                Err(e) => self.fail(op, &file_name, &e),
            },
            Outcome::Deleted { file_name, result } => match result {
                Ok(_) => {
                    info!(file_name = %file_name, "delete succeeded");
                    if let Some(pos) = self.uploaded_files.iter().position(|f| *f == file_name) {
                        self.uploaded_files.remove(pos);
                    }
                    self.notifications.success(format!("Deleted {}", file_name));
                    self.record(op, &file_name, ActivityStatus::Success);
                }
                Err(e) => self.fail(op, &file_name, &e),
            },
            Outcome::Processed(result) => match result {
                Ok(ack) => {
                    info!("processing finished");
                    self.notifications
                        .success(ack_message(&ack, "Processing complete"));
                    self.record(op, "uploaded images", ActivityStatus::Success);
                    return Some(FollowUp::RefreshLatest);
                }
                Err(e) => self.fail(op, "uploaded images", &e),
            },
            Outcome::LatestLoaded(result) => match result {
                Ok(batch) => {
                    info!(folder = ?batch.folder, files = batch.files.len(), "latest batch loaded");
                    self.notifications.info(batch_summary(&batch));
                    self.latest_batch = batch;
                }
                Err(e) => self.fail(op, "latest batch", &e),
            },
            Outcome::ArchiveSaved(result) => match result {
                Ok(saved) => {
                    info!(path = %saved.path.display(), size = saved.size, "archive saved");
                    self.notifications.success(format!(
                        "Saved {} ({})",
                        saved.path.display(),
                        format_size(saved.size)
                    ));
                    let subject = saved.path.display().to_string();
                    self.record(op, &subject, ActivityStatus::Success);
                }
                Err(e) => self.fail(op, "batch archive", &e),
            },
            Outcome::FileSaved { file_name, result } => match result {
                Ok(saved) => {
                    info!(path = %saved.path.display(), size = saved.size, "file saved");
                    self.notifications.success(format!(
                        "Saved {} ({})",
                        saved.path.display(),
                        format_size(saved.size)
                    ));
                    self.record(op, &file_name, ActivityStatus::Success);
                }
                Err(e) => self.fail(op, &file_name, &e),
            },
        }
        None
    }

    fn fail(&mut self, op: Operation, subject: &str, err: &ApiError) {
        error!(operation = ?op, subject, status = ?err.status(), error = %err, "request failed");
        self.notifications
            .error(format!("{} failed: {}", op.label(), err));
        self.record(op, subject, ActivityStatus::Error(err.to_string()));
    }

    fn record(&mut self, operation: Operation, subject: &str, status: ActivityStatus) {
        self.activity.push(Activity {
            operation,
            subject: subject.to_string(),
            status,
        });
        if self.activity.len() > MAX_ACTIVITY {
            let excess = self.activity.len() - MAX_ACTIVITY;
            self.activity.drain(..excess);
        }
    }

    pub fn clear_activity(&mut self) {
        self.activity.clear();
        self.show_details = false;
    }
}

fn batch_summary(batch: &LatestBatch) -> String {
    match batch.folder.as_deref() {
        Some(folder) => format!("Latest batch {}: {} file(s)", folder, batch.files.len()),
        None => "No processed images yet".to_string(),
    }
}

fn ack_message(ack: &Ack, fallback: &str) -> String {
    ack.summary()
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

use serde::Deserialize;

/// Listing returned by `GET /latest-pros/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LatestBatch {
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl LatestBatch {
    pub fn new(folder: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            folder: Some(folder.into()),
            files,
        }
    }

    /// Name offered in the save dialog for the batch archive.
    pub fn archive_name(&self) -> String {
        match self.folder.as_deref() {
            Some(folder) if !folder.is_empty() => format!("{}.zip", folder),
            _ => "processed.zip".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folder.is_none() && self.files.is_empty()
    }
}

/// Acknowledgement body returned by the upload, process and delete endpoints.
///
/// The server is loose about which key it uses, so every known one is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    pub info: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl Ack {
    pub fn summary(&self) -> Option<&str> {
        self.info
            .as_deref()
            .or(self.status.as_deref())
            .or(self.message.as_deref())
    }
}

/// Bytes written to disk by one of the download calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: std::path::PathBuf,
    pub size: u64,
}

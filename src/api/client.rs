use super::error::ApiError;
use super::types::{Ack, LatestBatch, SavedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the image processing server.
///
/// Cheap to clone; every spawned request task gets its own copy.
#[derive(Clone, Debug)]
pub struct ProcessorClient {
    base_url: Url,
    client: Client,
}

impl ProcessorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Uploads a file from disk as multipart field `file`.
    pub async fn upload_file(&self, path: &Path) -> Result<Ack, ApiError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidFileName(path.display().to_string()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(&file_name, bytes).await
    }

    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<Ack, ApiError> {
        let url = self.endpoint(&["upload"], true)?;
        debug!(%url, file_name, size = bytes.len(), "uploading file");

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let response = ensure_success(response).await?;
        Ok(read_ack(response).await)
    }

    pub async fn delete_file(&self, file_name: &str) -> Result<Ack, ApiError> {
        let url = self.endpoint(&["delete", file_name], false)?;
        debug!(%url, "deleting file");

        let response = self.client.delete(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(read_ack(response).await)
    }

    pub async fn process(&self) -> Result<Ack, ApiError> {
        let url = self.endpoint(&["process"], true)?;
        debug!(%url, "triggering processing");

        let response = self.client.post(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(read_ack(response).await)
    }

    pub async fn latest_batch(&self) -> Result<LatestBatch, ApiError> {
        let url = self.endpoint(&["latest-pros"], true)?;
        debug!(%url, "fetching latest batch");

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetches the zip archive of the latest batch.
    pub async fn download_latest_archive(&self) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["download-latest-pros"], true)?;
        debug!(%url, "downloading latest batch archive");
        self.download(url).await
    }

    pub async fn save_latest_archive(&self, dest: &Path) -> Result<SavedFile, ApiError> {
        let bytes = self.download_latest_archive().await?;
        write_download(dest, &bytes).await
    }

    pub fn processed_file_url(&self, folder: &str, file: &str) -> Result<Url, ApiError> {
        self.endpoint(&["processed", folder, file], false)
    }

    pub async fn download_processed_file(
        &self,
        folder: &str,
        file: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.processed_file_url(folder, file)?;
        debug!(%url, "downloading processed file");
        self.download(url).await
    }

    /// Downloads one processed file into `dir`, keeping its file name.
    pub async fn save_processed_file(
        &self,
        folder: &str,
        file: &str,
        dir: &Path,
    ) -> Result<SavedFile, ApiError> {
        // Only the last component of a server-provided name is trusted.
        let local_name = Path::new(file)
            .file_name()
            .ok_or_else(|| ApiError::InvalidFileName(file.to_string()))?;
        let bytes = self.download_processed_file(folder, file).await?;
        tokio::fs::create_dir_all(dir).await?;
        write_download(&dir.join(local_name), &bytes).await
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::EmptyDownload);
        }
        Ok(bytes.to_vec())
    }

    fn endpoint(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ApiError::InvalidUrl(format!(
            "{}: expected an http(s) URL with a host",
            raw
        ))),
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .ok()
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn read_ack(response: Response) -> Ack {
    match response.text().await {
        Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
        Err(_) => Ack::default(),
    }
}

async fn write_download(dest: &Path, bytes: &[u8]) -> Result<SavedFile, ApiError> {
    tokio::fs::write(dest, bytes).await?;
    Ok(SavedFile {
        path: dest.to_path_buf(),
        size: bytes.len() as u64,
    })
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

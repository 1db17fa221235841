//! Upload collaborator: turns profile attachments into hosted URLs.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::error::{RequestError, RequestErrorKind};
use crate::transport::classify_reqwest_error;

/// Kind of profile attachment being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    Avatar,
    Cv,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatar",
            UploadKind::Cv => "cv",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_type_for_extension(&file_name).map(str::to_string);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Reads an attachment from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// Returns MIME type inferred from file extension for supported attachments.
#[must_use]
pub fn mime_type_for_extension(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// Async upload result: one URL per input file, in input order.
pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, RequestError>> + Send + 'a>>;

/// Uploads attachments and returns their hosted URLs.
pub trait Uploader: Send + Sync {
    fn upload<'a>(&'a self, files: &'a [Attachment], kind: UploadKind) -> UploadFuture<'a>;
}

/// Multipart uploader for Cloudinary-style unsigned upload endpoints.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    url: Option<String>,
    preset: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl HttpUploader {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &UploadConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            url: config.effective_url(),
            preset: config.preset.clone(),
            folder: config.folder.clone(),
        })
    }

    async fn upload_one(&self, url: &str, file: &Attachment, kind: UploadKind) -> Result<String, RequestError> {
        let mut part = reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(mime) = file.content_type.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|e| RequestError::new(RequestErrorKind::Upload, e.to_string()))?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone())
            .text("folder", format!("{}/{kind}", self.folder));

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(RequestError::http_status(status.as_u16(), &body));
        }

        let payload: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            RequestError::new(RequestErrorKind::Decode, format!("Failed to parse upload response: {e}"))
        })?;
        payload.secure_url.or(payload.url).ok_or_else(|| {
            RequestError::new(RequestErrorKind::Upload, "upload response has no url")
        })
    }
}

impl Uploader for HttpUploader {
    fn upload<'a>(&'a self, files: &'a [Attachment], kind: UploadKind) -> UploadFuture<'a> {
        Box::pin(async move {
            let Some(url) = self.url.as_deref() else {
                return Err(RequestError::new(
                    RequestErrorKind::Upload,
                    "upload URL is not configured",
                ));
            };

            let mut urls = Vec::with_capacity(files.len());
            for file in files {
                tracing::debug!(%kind, file = %file.file_name, size = file.bytes.len(), "uploading");
                urls.push(self.upload_one(url, file, kind).await?);
            }
            Ok(urls)
        })
    }
}

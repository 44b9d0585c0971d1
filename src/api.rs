// Upload client: turns the selected file into one POST request against the
// configured endpoint and reports the outcome through a status sink.
//
// An attempt suspends twice, once while the file content is read and once
// while waiting for the response. There is no retry, no timeout and no
// cancellation; overlapping attempts run independently and whichever
// finishes last writes the status last.

use crate::config::{TransportMode, UploadConfig};
use crate::error::UploadError;
use crate::file::{data_url, mime_allowed, part_mime_type, strip_data_url_prefix, FileData, FileInput};
use crate::ui::StatusSink;
use anyhow::{Context, Result};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

/// JSON body sent in base64 mode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Base64Payload {
    pub is_base64_encoded: bool,
    pub body: String,
}

impl Base64Payload {
    /// Build the payload from a `data:` URL, keeping only the part after
    /// the first comma.
    pub fn from_data_url(data_url: &str) -> Self {
        Base64Payload {
            is_base64_encoded: true,
            body: strip_data_url_prefix(data_url).to_string(),
        }
    }
}

/// Outcome of one attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Success(String),
    Failure(String),
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success(_))
    }
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadResult::Success(msg) => write!(f, "✅ Success: {}", msg),
            UploadResult::Failure(reason) => write!(f, "❌ Error: {}", reason),
        }
    }
}

/// Client bound to a single endpoint and transport mode.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    config: UploadConfig,
}

impl UploadClient {
    /// Validate `config` and build a fresh HTTP client for it.
    pub fn new(config: UploadConfig) -> Result<Self> {
        config.validate().context("Invalid upload configuration")?;
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config))
    }

    /// Use an existing HTTP client. The configuration is taken as is.
    pub fn with_client(client: Client, config: UploadConfig) -> Self {
        UploadClient { client, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Run one attempt and write its outcome to `status` exactly once.
    /// Never fails: every error becomes an [`UploadResult::Failure`].
    pub async fn upload<I, S>(&self, input: &I, status: &S) -> UploadResult
    where
        I: FileInput + ?Sized,
        S: StatusSink + ?Sized,
    {
        let result = match self.try_upload(input).await {
            Ok(message) => UploadResult::Success(message),
            Err(err) => {
                log_failure(&err);
                UploadResult::Failure(err.user_message())
            }
        };
        status.show(&result.to_string());
        debug!(state = "idle", success = result.is_success(), "upload attempt finished");
        result
    }

    /// Same as [`upload`](Self::upload) without touching the status sink.
    pub async fn try_upload<I>(&self, input: &I) -> Result<String, UploadError>
    where
        I: FileInput + ?Sized,
    {
        let file = input.selected_file().ok_or(UploadError::NoFileSelected)?;

        // A declared type is checked before anything is read; files from
        // disk are typed by their content, so they are checked after the read.
        debug!(state = "validating", file = file.name(), mime = ?file.declared_mime_type());
        if let Some(mime) = file.declared_mime_type() {
            self.check_type(mime)?;
        }
        let data = file.read().await.map_err(|source| UploadError::FileRead {
            name: file.name().to_string(),
            source,
        })?;
        if file.declared_mime_type().is_none() {
            self.check_type(&data.mime_type)?;
        }

        debug!(state = "encoding", mode = %self.config.mode);
        let request = self.encode(file.name(), data)?;

        debug!(state = "requesting", endpoint = %self.config.endpoint);
        let response = request.send().await.map_err(UploadError::Network)?;
        read_outcome(response).await
    }

    fn check_type(&self, mime: &str) -> Result<(), UploadError> {
        match &self.config.allowed_mime_types {
            Some(allowed) if !mime_allowed(mime, allowed) => Err(UploadError::DisallowedType {
                mime: mime.to_string(),
                allowed: allowed.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn encode(&self, name: &str, data: FileData) -> Result<RequestBuilder, UploadError> {
        let request = self.client.post(&self.config.endpoint);

        match self.config.mode {
            TransportMode::Multipart => {
                // Content-Type with the boundary is set by reqwest.
                let part = multipart::Part::bytes(data.bytes)
                    .file_name(name.to_string())
                    .mime_str(part_mime_type(&data.mime_type))
                    .map_err(|e| UploadError::Encode(format!("invalid MIME type: {}", e)))?;
                let form = multipart::Form::new().part(self.config.file_field.clone(), part);
                Ok(request.multipart(form))
            }
            TransportMode::Base64Json => {
                let header = HeaderName::from_bytes(self.config.filename_header.as_bytes())
                    .map_err(|e| UploadError::Encode(format!("invalid header name: {}", e)))?;
                let value = HeaderValue::from_str(name)
                    .map_err(|e| UploadError::Encode(format!("invalid filename header: {}", e)))?;
                let payload = Base64Payload::from_data_url(&data_url(&data.mime_type, &data.bytes));
                Ok(request
                    .header(CONTENT_TYPE, "application/json")
                    .header(header, value)
                    .json(&payload))
            }
        }
    }
}

/// Pull the human-readable text out of a response body: the `message`
/// field when the body is a JSON object carrying one, otherwise the trimmed
/// text. `None` for an empty body.
pub fn response_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

async fn read_outcome(response: Response) -> Result<String, UploadError> {
    let status = response.status();
    let body = response.text().await.map_err(UploadError::ResponseBody)?;
    let message = response_message(&body);

    if status.is_success() {
        info!(status = status.as_u16(), "upload accepted");
        Ok(message.unwrap_or_else(|| format!("Upload complete (HTTP {})", status.as_u16())))
    } else {
        Err(UploadError::Server {
            status: status.as_u16(),
            message: message
                .unwrap_or_else(|| format!("Upload failed with status: {}", status.as_u16())),
        })
    }
}

fn log_failure(err: &UploadError) {
    match err {
        UploadError::NoFileSelected | UploadError::DisallowedType { .. } => {
            info!(reason = %err, "upload not sent")
        }
        UploadError::Server { status, .. } => warn!(status, error = %err, "upload rejected"),
        UploadError::FileRead { source, .. } => error!(error = %err, cause = ?source, "upload not sent"),
        UploadError::Network(source) | UploadError::ResponseBody(source) => {
            error!(error = %err, cause = ?source, "upload failed")
        }
        UploadError::Encode(_) => error!(error = %err, "upload not sent"),
    }
}

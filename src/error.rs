// Error types shared by the upload client and the configuration loader.
// Every upload failure ends up as a single line of status text; the
// mapping from error to that text lives here so the client and the tests
// agree on the exact wording.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Shown when the upload is triggered without a selected file.
pub const NO_FILE_MESSAGE: &str = "Please select a file/image";

/// Shown for any transport-level failure. Details go to the log only.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error.";

/// Shown when the response arrived but its body could not be read.
pub const GENERIC_FAILURE_MESSAGE: &str = "Upload failed. Check logs for details.";

/// Everything that can end an upload attempt without a success message.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("file type '{mime}' is not in the allow-list")]
    DisallowedType { mime: String, allowed: Vec<String> },

    #[error("failed to read '{name}': {source}")]
    FileRead {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to build upload request: {0}")]
    Encode(String),

    #[error("request could not be completed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("failed to read response body: {0}")]
    ResponseBody(#[source] reqwest::Error),
}

impl UploadError {
    /// Text for the status area. Network and body-read errors collapse to
    /// generic wording; their detail is only logged.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::NoFileSelected => NO_FILE_MESSAGE.to_string(),
            UploadError::DisallowedType { mime, allowed } => format!(
                "Invalid file type '{}'. Allowed: {}.",
                mime,
                allowed.join(", ")
            ),
            UploadError::FileRead { name, .. } => format!("Could not read file '{}'.", name),
            UploadError::Encode(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            UploadError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            UploadError::Server { message, .. } => message.clone(),
            UploadError::ResponseBody(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// True for failures caught before any request was sent.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            UploadError::NoFileSelected
                | UploadError::DisallowedType { .. }
                | UploadError::FileRead { .. }
        )
    }
}

/// Problems found while assembling an [`crate::config::UploadConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown transport mode '{0}' (expected 'multipart' or 'base64-json')")]
    UnknownMode(String),

    #[error("endpoint is still the placeholder '{0}'; set IMGDROP_ENDPOINT or --endpoint")]
    PlaceholderEndpoint(String),

    #[error("endpoint '{0}' is not an absolute http(s) URL")]
    InvalidEndpoint(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallowed_type_lists_allowed_types() {
        let err = UploadError::DisallowedType {
            mime: "text/plain".into(),
            allowed: vec!["image/png".into(), "image/jpeg".into()],
        };
        assert_eq!(
            err.user_message(),
            "Invalid file type 'text/plain'. Allowed: image/png, image/jpeg."
        );
        assert!(err.is_user_input());
    }

    #[test]
    fn server_error_surfaces_message_verbatim() {
        let err = UploadError::Server {
            status: 400,
            message: "Missing or invalid 'file-name' header.".into(),
        };
        assert_eq!(err.user_message(), "Missing or invalid 'file-name' header.");
        assert!(!err.is_user_input());
    }

    #[test]
    fn no_file_uses_fixed_message() {
        assert_eq!(UploadError::NoFileSelected.user_message(), NO_FILE_MESSAGE);
    }
}

// Configuration for the upload client: where to send files and how to
// encode them. One configuration fixes one transport mode; the client never
// negotiates the mode with the server.
//
// Values come from built-in defaults, then an optional JSON file, then the
// environment. The binary applies command line flags on top.

use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Endpoint value shipped in the defaults; must be replaced before use.
pub const PLACEHOLDER_ENDPOINT: &str = "YOUR_API_GATEWAY_ENDPOINT/upload";

/// Multipart field name the receiving function reads the file from.
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Header carrying the original filename in base64 mode.
pub const DEFAULT_FILENAME_HEADER: &str = "file-name";

pub const DEFAULT_ALLOWED_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// How the file is packaged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// `multipart/form-data` with the file as a named part.
    #[default]
    Multipart,
    /// JSON `{"isBase64Encoded": true, "body": "..."}` plus a filename header.
    Base64Json,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multipart" | "form" => Ok(TransportMode::Multipart),
            "base64-json" | "base64" | "json" => Ok(TransportMode::Base64Json),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Multipart => f.write_str("multipart"),
            TransportMode::Base64Json => f.write_str("base64-json"),
        }
    }
}

/// Everything the client needs to know about its single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub endpoint: String,
    pub mode: TransportMode,
    pub file_field: String,
    pub filename_header: String,
    /// `None` disables the MIME check entirely.
    pub allowed_mime_types: Option<Vec<String>>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            endpoint: PLACEHOLDER_ENDPOINT.to_string(),
            mode: TransportMode::default(),
            file_field: DEFAULT_FILE_FIELD.to_string(),
            filename_header: DEFAULT_FILENAME_HEADER.to_string(),
            allowed_mime_types: Some(DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl UploadConfig {
    /// Defaults with the given endpoint and mode.
    pub fn new(endpoint: impl Into<String>, mode: TransportMode) -> Self {
        UploadConfig {
            endpoint: endpoint.into(),
            mode,
            ..Default::default()
        }
    }

    pub fn with_allowed_types(mut self, allowed: Option<Vec<String>>) -> Self {
        self.allowed_mime_types = allowed;
        self
    }

    /// `<config dir>/imgdrop/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("imgdrop").join("config.json"))
    }

    /// Parse a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` (which must exist) or from the default location
    /// (skipped when absent), then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `IMGDROP_ENDPOINT` (the full upload URL, not a base URL) and
    /// `IMGDROP_MODE` through the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("IMGDROP_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(mode) = lookup("IMGDROP_MODE") {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    /// Reject configurations that cannot produce a sensible request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.contains("YOUR_API_GATEWAY_ENDPOINT") {
            return Err(ConfigError::PlaceholderEndpoint(self.endpoint.clone()));
        }
        match Url::parse(&self.endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => return Err(ConfigError::InvalidEndpoint(self.endpoint.clone())),
        }
        if self.file_field.trim().is_empty() {
            return Err(ConfigError::Empty("file field name"));
        }
        if self.filename_header.trim().is_empty() {
            return Err(ConfigError::Empty("filename header"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_the_upload_function() {
        let config = UploadConfig::default();
        assert_eq!(config.mode, TransportMode::Multipart);
        assert_eq!(config.file_field, "file");
        assert_eq!(config.filename_header, "file-name");
        assert_eq!(
            config.allowed_mime_types,
            Some(vec!["image/png".to_string(), "image/jpeg".to_string()])
        );
    }

    #[test]
    fn placeholder_endpoint_is_rejected() {
        let err = UploadConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::PlaceholderEndpoint(_)));
    }

    #[test]
    fn relative_or_non_http_endpoint_is_rejected() {
        for endpoint in ["/upload", "ftp://example.com/upload", "not a url"] {
            let config = UploadConfig::new(endpoint, TransportMode::Multipart);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))),
                "{endpoint} should be rejected"
            );
        }
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let mut config = UploadConfig::new("https://example.com/prod/upload", TransportMode::Multipart);
        assert!(config.validate().is_ok());
        config.file_field = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Empty(_))));
    }

    #[test]
    fn mode_parsing_accepts_aliases() {
        assert_eq!("multipart".parse::<TransportMode>().unwrap(), TransportMode::Multipart);
        assert_eq!("Base64-JSON".parse::<TransportMode>().unwrap(), TransportMode::Base64Json);
        assert_eq!("base64".parse::<TransportMode>().unwrap(), TransportMode::Base64Json);
        assert!(matches!(
            "chunked".parse::<TransportMode>(),
            Err(ConfigError::UnknownMode(m)) if m == "chunked"
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("IMGDROP_ENDPOINT", "https://abc.example.com/prod/upload"),
            ("IMGDROP_MODE", "base64-json"),
            ("API_GATEWAY_URL", "https://gateway.example.com"),
        ]
        .into_iter()
        .collect();
        let mut config = UploadConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.endpoint, "https://abc.example.com/prod/upload");
        assert_eq!(config.mode, TransportMode::Base64Json);
    }

    #[test]
    fn gateway_base_url_is_not_an_endpoint() {
        let mut config = UploadConfig::default();
        config
            .apply_env(|key| (key == "API_GATEWAY_URL").then(|| "https://gateway.example.com".to_string()))
            .unwrap();
        assert_eq!(config.endpoint, PLACEHOLDER_ENDPOINT);
    }

    #[test]
    fn file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"endpoint": "https://example.com/upload", "mode": "base64-json", "allowed_mime_types": null}}"#
        )
        .unwrap();

        let config = UploadConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "https://example.com/upload");
        assert_eq!(config.mode, TransportMode::Base64Json);
        assert_eq!(config.file_field, DEFAULT_FILE_FIELD);
        assert_eq!(config.allowed_mime_types, None);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "endpoint = 'toml?'").unwrap();
        assert!(matches!(
            UploadConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}

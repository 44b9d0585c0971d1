// The file being uploaded and the input handle it is picked from.
//
// A `SelectedFile` is either already in memory or backed by a path on disk.
// Path-backed content is only read when the client asks for it, which keeps
// the read as its own await point in the upload routine. Files from disk
// have no declared type; theirs is sniffed from the bytes that were read.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// MIME type used when nothing better can be determined.
pub const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone)]
enum FileContent {
    Memory { mime_type: String, bytes: Vec<u8> },
    Path(PathBuf),
}

/// A file chosen by the user for one upload attempt.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    content: FileContent,
}

/// Content of a [`SelectedFile`] after reading, with its effective type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// File whose content is already in memory. `mime_type` may be empty
    /// when the kind of file is unknown.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        SelectedFile {
            name: name.into(),
            content: FileContent::Memory {
                mime_type: mime_type.into(),
                bytes: content.into(),
            },
        }
    }

    /// File on disk. Nothing is touched until [`read`](Self::read).
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        SelectedFile {
            name,
            content: FileContent::Path(path),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type declared at selection time; `None` for files from disk.
    pub fn declared_mime_type(&self) -> Option<&str> {
        match &self.content {
            FileContent::Memory { mime_type, .. } => Some(mime_type.as_str()),
            FileContent::Path(_) => None,
        }
    }

    /// Load the full content. Files from disk get their type sniffed from
    /// the loaded bytes.
    pub async fn read(&self) -> io::Result<FileData> {
        match &self.content {
            FileContent::Memory { mime_type, bytes } => Ok(FileData {
                mime_type: mime_type.clone(),
                bytes: bytes.clone(),
            }),
            FileContent::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                let mime_type = detect_mime(&bytes);
                debug!(path = %path.display(), mime = %mime_type, "read file from disk");
                Ok(FileData { mime_type, bytes })
            }
        }
    }
}

/// Source of the currently selected file, if any.
pub trait FileInput {
    fn selected_file(&self) -> Option<SelectedFile>;
}

impl FileInput for Option<SelectedFile> {
    fn selected_file(&self) -> Option<SelectedFile> {
        self.clone()
    }
}

/// Input backed by a path typed at a prompt or passed on the command line.
/// An empty or whitespace-only path counts as no selection.
#[derive(Debug, Clone, Default)]
pub struct PathInput {
    path: Option<PathBuf>,
}

impl PathInput {
    pub fn new(path: Option<PathBuf>) -> Self {
        PathInput { path }
    }

    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            PathInput::default()
        } else {
            PathInput::new(Some(PathBuf::from(trimmed)))
        }
    }
}

impl FileInput for PathInput {
    fn selected_file(&self) -> Option<SelectedFile> {
        self.path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(SelectedFile::from_path)
    }
}

/// Sniff the MIME type from leading bytes, falling back to octet-stream.
pub fn detect_mime(content: &[u8]) -> String {
    infer::get(content)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// Type to put on a multipart part. Empty or malformed types become
/// [`FALLBACK_MIME`]; parameters are dropped.
pub fn part_mime_type(mime: &str) -> &str {
    let essence = mime.split(';').next().unwrap_or("").trim();
    let is_token = |s: &str| {
        !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    };
    match essence.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => essence,
        _ => FALLBACK_MIME,
    }
}

/// Whether `mime` matches one of `allowed`, ignoring case and parameters.
pub fn mime_allowed(mime: &str, allowed: &[String]) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(essence))
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(mime_type: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(content))
}

/// Drop everything up to and including the first comma. Input without a
/// comma is returned unchanged.
pub fn strip_data_url_prefix(data_url: &str) -> &str {
    match data_url.split_once(',') {
        Some((_, payload)) => payload,
        None => data_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn data_url_prefix_is_stripped() {
        let url = data_url("image/png", b"ab");
        assert_eq!(url, "data:image/png;base64,YWI=");
        assert_eq!(strip_data_url_prefix(&url), "YWI=");
    }

    #[test]
    fn strip_without_comma_is_identity() {
        assert_eq!(strip_data_url_prefix("YWI="), "YWI=");
    }

    #[test]
    fn mime_check_ignores_case_and_parameters() {
        let allowed = vec!["image/png".to_string(), "image/jpeg".to_string()];
        assert!(mime_allowed("IMAGE/PNG", &allowed));
        assert!(mime_allowed("image/jpeg; q=0.9", &allowed));
        assert!(!mime_allowed("image/gif", &allowed));
        assert!(!mime_allowed("", &allowed));
    }

    #[test]
    fn empty_path_text_means_no_selection() {
        assert!(PathInput::from_text("   ").selected_file().is_none());
        assert!(PathInput::default().selected_file().is_none());
    }

    #[test]
    fn part_type_falls_back_for_empty_or_malformed() {
        assert_eq!(part_mime_type("image/png"), "image/png");
        assert_eq!(part_mime_type("text/plain; charset=utf-8"), "text/plain");
        assert_eq!(part_mime_type(""), FALLBACK_MIME);
        assert_eq!(part_mime_type("image"), FALLBACK_MIME);
        assert_eq!(part_mime_type("image/"), FALLBACK_MIME);
        assert_eq!(part_mime_type("im age/png"), FALLBACK_MIME);
    }

    #[test]
    fn unknown_bytes_sniff_as_octet_stream() {
        assert_eq!(detect_mime(&PNG_MAGIC), "image/png");
        assert_eq!(detect_mime(b"ab"), FALLBACK_MIME);
    }

    #[tokio::test]
    async fn path_backed_file_is_sniffed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&PNG_MAGIC).unwrap();
        f.write_all(&[0u8; 16]).unwrap();
        drop(f);

        let file = PathInput::new(Some(path)).selected_file().unwrap();
        assert_eq!(file.name(), "cat.bin");
        assert_eq!(file.declared_mime_type(), None);
        let data = file.read().await.unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(data.bytes.len(), 24);
    }

    #[tokio::test]
    async fn in_memory_file_keeps_declared_type() {
        let file = SelectedFile::from_bytes("blob", "", b"ab".to_vec());
        assert_eq!(file.declared_mime_type(), Some(""));
        let data = file.read().await.unwrap();
        assert_eq!(data.mime_type, "");
        assert_eq!(data.bytes, b"ab");
    }

    #[tokio::test]
    async fn missing_path_fails_on_read() {
        let file = SelectedFile::from_path("/definitely/not/here.png");
        assert_eq!(file.name(), "here.png");
        assert!(file.read().await.is_err());
    }
}

use std::path::Path;

use base64::Engine as _;
use serde::Serialize;

/// Default cap on a single inlined file. Larger files are skipped.
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Extension → MIME type for files the endpoint accepts as inline data.
static MIME_TABLE: &[(&str, &str)] = &[
    // images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("gif", "image/gif"),
    // documents
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/md"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("py", "text/x-python"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("rtf", "text/rtf"),
    // audio
    ("mp3", "audio/mp3"),
    ("wav", "audio/wav"),
    ("aiff", "audio/aiff"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    // video
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mov", "video/mov"),
    ("avi", "video/avi"),
    ("webm", "video/webm"),
    ("wmv", "video/wmv"),
    ("3gp", "video/3gpp"),
    ("flv", "video/x-flv"),
];

/// A file embedded directly in the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Standard base64 of the file bytes.
    pub data: String,
}

/// Resolve a MIME type from the file extension (case-insensitive).
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Read and encode one attachment.
///
/// Returns `None` (after logging) when the extension is unknown, the file
/// cannot be read, or it exceeds `max_bytes`. A skipped attachment never
/// fails the request.
pub async fn encode(path: &Path, max_bytes: u64) -> Option<InlineData> {
    let Some(mime_type) = mime_for_path(path) else {
        tracing::warn!(path = %path.display(), "skipping attachment: unrecognized file type");
        return None;
    };

    // Size check before reading so an oversized file is never loaded.
    match tokio::fs::metadata(path).await {
        Ok(m) if m.len() > max_bytes => {
            tracing::warn!(
                path = %path.display(),
                size = m.len(),
                max_bytes,
                "skipping attachment: file too large"
            );
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), "skipping attachment: {e}");
            return None;
        }
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(path = %path.display(), "skipping attachment: {e}");
            return None;
        }
    };

    tracing::debug!(path = %path.display(), mime_type, bytes = bytes.len(), "inlined attachment");

    Some(InlineData {
        mime_type: mime_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_ignores_case() {
        assert_eq!(mime_for_path(Path::new("photo.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("/a/b/report.pdf")), Some("application/pdf"));
    }

    #[test]
    fn unknown_or_missing_extension_has_no_mime() {
        assert_eq!(mime_for_path(Path::new("archive.zip")), None);
        assert_eq!(mime_for_path(Path::new("Makefile")), None);
    }

    #[tokio::test]
    async fn missing_file_is_skipped() {
        let path = std::env::temp_dir().join("parley-attachment-does-not-exist.png");
        assert!(encode(&path, MAX_ATTACHMENT_BYTES).await.is_none());
    }

    #[tokio::test]
    async fn encodes_file_as_base64() {
        let path = std::env::temp_dir().join("parley-attachment-unit.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let inline = encode(&path, MAX_ATTACHMENT_BYTES).await.unwrap();
        assert_eq!(inline.mime_type, "text/plain");
        assert_eq!(inline.data, "aGVsbG8=");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn oversized_file_is_skipped() {
        let path = std::env::temp_dir().join("parley-attachment-oversized.txt");
        tokio::fs::write(&path, vec![b'a'; 64]).await.unwrap();

        assert!(encode(&path, 16).await.is_none());

        let _ = tokio::fs::remove_file(&path).await;
    }
}

//! Content type detection from item names.

/// Guess a MIME type from the extension of the last path segment.
///
/// Returns `None` for names without an extension or with an unknown one.
pub fn mime_from_path(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let mime = match ext.to_lowercase().as_str() {
        "txt" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(mime_from_path("uploads/a/c.txt").as_deref(), Some("text/plain"));
        assert_eq!(mime_from_path("photo.JPG").as_deref(), Some("image/jpeg"));
        assert_eq!(mime_from_path("archive.tar.gz").as_deref(), Some("application/gzip"));
    }

    #[test]
    fn test_no_or_unknown_extension() {
        assert_eq!(mime_from_path("Makefile"), None);
        assert_eq!(mime_from_path("txt"), None);
        assert_eq!(mime_from_path("data.bin"), None);
        assert_eq!(mime_from_path("dir.txt/readme"), None);
        assert_eq!(mime_from_path(".txt"), None);
    }
}

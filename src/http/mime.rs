//! MIME type detection based on file extensions.

const DEFAULT_MIME: &str = "application/octet-stream";

/// Content type for a file extension, compared case-insensitively.
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => DEFAULT_MIME,
    }
}

/// Content type for a request path such as `/styles.css`.
///
/// ```
/// # use rawhttp::http::mime::mime_type_for_path;
/// assert_eq!(mime_type_for_path("/spring.svg"), "image/svg+xml");
/// assert_eq!(mime_type_for_path("/README"), "application/octet-stream");
/// ```
pub fn mime_type_for_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => mime_type_for_extension(ext),
        _ => DEFAULT_MIME,
    }
}

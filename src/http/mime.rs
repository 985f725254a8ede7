//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension. The JSON
//! data files and the Opus audio clips get explicit types ahead of the
//! general table; browsers refuse to parse them under the generic fallback.

/// Get MIME Content-Type based on file extension (case-insensitive)
///
/// # Examples
/// ```
/// use reciteserve::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("json")), "application/json");
/// assert_eq!(get_content_type(Some("opus")), "audio/ogg");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let lowered = extension.map(str::to_ascii_lowercase);
    match lowered.as_deref() {
        // Library data and audio, served with exact types
        Some("json") => "application/json",
        Some("opus") => "audio/ogg",

        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "application/javascript",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Default
        _ => "application/octet-stream",
    }
}

//! Static file serving module
//!
//! Resolves a request path under the servable root, picks a Content-Type,
//! and builds the response: file bytes, a directory listing, or an error
//! page.

use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::io;
use std::path::Path;
use tokio::fs;

/// Characters escaped in directory listing hrefs
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?');

/// Serve a request path from the servable tree.
///
/// The path is taken from the request URI (query string already stripped)
/// and still percent-encoded.
pub async fn serve(path: &str, is_head: bool, state: &AppState) -> Response<Full<Bytes>> {
    // The front-end lives at the root; "/" means the index document
    let request_path = if path == "/" {
        format!("/{}", state.config.site.index_file)
    } else {
        path.to_string()
    };

    let Ok(decoded) = percent_decode_str(&request_path).decode_utf8() else {
        logger::log_warning(&format!("Undecodable request path: {request_path}"));
        return http::build_400_response();
    };

    let joined = state.root.join(decoded.trim_start_matches('/'));

    // Canonicalization resolves `..` segments and symlinks; anything that
    // lands outside the root is treated as missing.
    let file_path = match joined.canonicalize() {
        Ok(p) => p,
        Err(e) => return resolve_error_response(&joined, &e),
    };
    if !file_path.starts_with(&state.root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path.display()
        ));
        return http::build_404_response();
    }

    if file_path.is_dir() {
        return serve_directory(&file_path, path, &decoded, is_head, state).await;
    }

    serve_file(&file_path, is_head).await
}

/// Read a file and build the 200 response for it
async fn serve_file(file_path: &Path, is_head: bool) -> Response<Full<Bytes>> {
    match fs::read(file_path).await {
        Ok(content) => {
            let content_type =
                mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
            http::build_file_response(Bytes::from(content), content_type, is_head)
        }
        // Existence was confirmed during resolution, so a failure here is a
        // race with deletion or a permission change
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied: {}", file_path.display()));
            http::build_403_response()
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            http::build_500_response()
        }
    }
}

/// Serve a directory: redirect to the slashed form, then the index document
/// if one exists inside, otherwise a listing
async fn serve_directory(
    dir: &Path,
    raw_path: &str,
    decoded_path: &str,
    is_head: bool,
    state: &AppState,
) -> Response<Full<Bytes>> {
    if !raw_path.ends_with('/') {
        return http::build_redirect_response(&format!("{raw_path}/"));
    }

    let index_path = dir.join(&state.config.site.index_file);
    if index_path.is_file() {
        return serve_file(&index_path, is_head).await;
    }

    match render_listing(dir, decoded_path).await {
        Ok(html) => http::build_html_response(html, is_head),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied: {}", dir.display()));
            http::build_403_response()
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_500_response()
        }
    }
}

/// Render an HTML listing of a directory, entries sorted by name
async fn render_listing(dir: &Path, request_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let title = escape_html(request_path);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Directory listing for {title}</title>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Directory listing for {title}</h1>\n<hr>\n<ul>\n"));
    for name in &entries {
        let href = utf8_percent_encode(name, HREF_ESCAPE);
        html.push_str(&format!(
            "<li><a href=\"{href}\">{}</a></li>\n",
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Map a path resolution failure to a status response
fn resolve_error_response(path: &Path, err: &io::Error) -> Response<Full<Bytes>> {
    match err.kind() {
        io::ErrorKind::NotFound => http::build_404_response(),
        io::ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied: {}", path.display()));
            http::build_403_response()
        }
        _ => {
            logger::log_error(&format!("Failed to resolve '{}': {err}", path.display()));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs as std_fs;
    use std::path::PathBuf;

    const INDEX_BODY: &str = "<html><body>recitation library</body></html>";
    const DATA_BODY: &str = "{\"a\":1}";

    /// Build a disposable site tree under the system temp directory.
    fn test_state(tag: &str) -> (AppState, PathBuf) {
        let root = std::env::temp_dir().join(format!(
            "reciteserve-test-{tag}-{}",
            std::process::id()
        ));
        std_fs::create_dir_all(root.join("audio")).unwrap();
        std_fs::write(root.join("index.html"), INDEX_BODY).unwrap();
        std_fs::write(root.join("data.json"), DATA_BODY).unwrap();
        std_fs::write(root.join("audio/sample.opus"), b"OggS fake opus payload").unwrap();
        let config = Config::load_from("no-such-config-file").unwrap();
        let root = root.canonicalize().unwrap();
        (AppState::new(config, root.clone()), root)
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        use http_body_util::BodyExt;
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn root_serves_the_index_document() {
        let (state, root) = test_state("root");
        let resp = serve("/", false, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(body_bytes(resp).await, Bytes::from(INDEX_BODY));
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn json_file_gets_exact_content_type_and_bytes() {
        let (state, root) = test_state("json");
        let resp = serve("/data.json", false, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["content-length"], "7");
        let body = body_bytes(resp).await;
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["a"], 1);
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn opus_file_is_audio_ogg() {
        let (state, root) = test_state("opus");
        let resp = serve("/audio/sample.opus", false, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "audio/ogg");
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let (state, root) = test_state("missing");
        let resp = serve("/missing.html", false, &state).await;
        assert_eq!(resp.status(), 404);
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn traversal_outside_root_is_rejected() {
        let (state, root) = test_state("traversal");
        let resp = serve("/../../etc/passwd", false, &state).await;
        assert_eq!(resp.status(), 404);
        let encoded = serve("/%2e%2e/%2e%2e/etc/passwd", false, &state).await;
        assert_eq!(encoded.status(), 404);
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let (state, root) = test_state("redirect");
        let resp = serve("/audio", false, &state).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/audio/");
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn directory_without_index_lists_entries() {
        let (state, root) = test_state("listing");
        let resp = serve("/audio/", false, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
        assert!(body.contains("sample.opus"));
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn head_request_has_empty_body_and_full_headers() {
        let (state, root) = test_state("head");
        let resp = serve("/data.json", true, &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "7");
        assert!(body_bytes(resp).await.is_empty());
        let _ = std_fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn served_bytes_match_the_source_file() {
        let (state, root) = test_state("roundtrip");
        let on_disk = std_fs::read(root.join("audio/sample.opus")).unwrap();
        let resp = serve("/audio/sample.opus", false, &state).await;
        assert_eq!(resp.headers()["content-length"], on_disk.len().to_string());
        assert_eq!(body_bytes(resp).await, Bytes::from(on_disk));
        let _ = std_fs::remove_dir_all(root);
    }
}

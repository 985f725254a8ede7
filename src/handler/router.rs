//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, body size
//! check, static file dispatch. Every response, error pages included, leaves
//! through a single exit where the CORS header set is injected.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, cors};
use crate::logger;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = respond(&req, &state).await;

    // Single exit: the CORS contract holds on every path, 404s included.
    cors::apply(&mut response);

    if state.config.logging.access_log {
        let body_bytes = response.body().size_hint().exact().unwrap_or(0);
        logger::log_access(&method, &path, response.status().as_u16(), body_bytes);
    }

    Ok(response)
}

async fn respond<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let method = req.method();

    // 1. Check HTTP method; OPTIONS preflights short-circuit here
    if let Some(resp) = check_http_method(method) {
        return resp;
    }

    // 2. Check declared body size
    if let Some(resp) = check_body_size(req, state.config.http.max_body_size) {
        return resp;
    }

    // 3. Serve from the tree
    let is_head = *method == Method::HEAD;
    static_files::serve(req.uri().path(), is_head, state).await
}

/// Check HTTP method and return an early response for non-GET/HEAD methods.
/// POST is advertised in the CORS headers but has no handler semantics.
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_state() -> Arc<AppState> {
        let config = Config::load_from("no-such-config-file").unwrap();
        let root = std::env::temp_dir().canonicalize().unwrap();
        Arc::new(AppState::new(config, root))
    }

    fn request(method: Method, path: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn assert_cors_headers(resp: &Response<Full<Bytes>>) {
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            "GET, POST, OPTIONS"
        );
        assert_eq!(resp.headers()["access-control-allow-headers"], "*");
    }

    #[tokio::test]
    async fn options_preflight_is_200_empty_with_cors() {
        let resp = handle_request(request(Method::OPTIONS, "/anything"), test_state())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body().size_hint().exact(), Some(0));
        assert_cors_headers(&resp);
    }

    #[tokio::test]
    async fn unsupported_method_is_405_with_cors() {
        let resp = handle_request(request(Method::PUT, "/index.html"), test_state())
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
        assert_cors_headers(&resp);
    }

    #[tokio::test]
    async fn missing_file_is_404_with_cors() {
        let resp = handle_request(
            request(Method::GET, "/definitely-not-present.html"),
            test_state(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), 404);
        assert_cors_headers(&resp);
    }

    #[tokio::test]
    async fn oversized_declared_body_is_413_with_cors() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header("content-length", "10485761")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, test_state()).await.unwrap();
        assert_eq!(resp.status(), 413);
        assert_cors_headers(&resp);
    }
}

//! CORS header injection module
//!
//! The front-end fetches the data files with JavaScript, which browsers only
//! allow cross-origin when these headers are present. The set is fixed and
//! goes onto every response the server produces, error pages included.

use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::Response;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "*";

/// Append the CORS header set to a response, after whatever headers the
/// responder already set.
pub fn apply<B>(response: &mut Response<B>) {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Bytes;

    #[test]
    fn injects_fixed_header_set() {
        let mut resp: Response<Full<Bytes>> = Response::new(Full::new(Bytes::new()));
        apply(&mut resp);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            "GET, POST, OPTIONS"
        );
        assert_eq!(resp.headers()["access-control-allow-headers"], "*");
    }

    #[test]
    fn reapplying_keeps_a_single_value() {
        let mut resp: Response<Full<Bytes>> = Response::new(Full::new(Bytes::new()));
        apply(&mut resp);
        apply(&mut resp);
        let count = resp
            .headers()
            .get_all("access-control-allow-origin")
            .iter()
            .count();
        assert_eq!(count, 1);
    }
}

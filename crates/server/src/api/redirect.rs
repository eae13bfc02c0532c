use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Host the request was addressed to, from the `Host` header.
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
}

/// Scheme the client used, trusting `X-Forwarded-Proto` from the proxy.
pub fn request_scheme(headers: &HeaderMap) -> &str {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http")
}

/// Site origin for absolute links: the configured public URL, else the
/// request's own scheme and host.
pub fn base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_owned();
    }
    let host = request_host(headers).unwrap_or("localhost");
    format!("{}://{host}", request_scheme(headers))
}

/// 301 any `www.` host to the same path on the bare domain.
pub async fn redirect_www(request: Request, next: Next) -> Response {
    let target = request_host(request.headers())
        .and_then(|host| host.strip_prefix("www."))
        .filter(|bare| !bare.is_empty())
        .map(|bare| {
            let path = request
                .uri()
                .path_and_query()
                .map_or("/", |pq| pq.as_str());
            format!("{}://{bare}{path}", request_scheme(request.headers()))
        });

    match target {
        Some(location) => Redirect::permanent(&location).into_response(),
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn configured_public_url_wins() {
        let h = headers(&[("host", "internal:8080")]);
        assert_eq!(
            base_url(Some("https://copilotthatjawn.com/"), &h),
            "https://copilotthatjawn.com"
        );
    }

    #[test]
    fn base_url_falls_back_to_forwarded_proto_and_host() {
        let h = headers(&[("host", "copilotthatjawn.com"), ("x-forwarded-proto", "https")]);
        assert_eq!(base_url(None, &h), "https://copilotthatjawn.com");

        let plain = headers(&[("host", "localhost:8080")]);
        assert_eq!(base_url(Some("  "), &plain), "http://localhost:8080");
    }

    #[test]
    fn forwarded_proto_takes_first_hop() {
        let h = headers(&[("x-forwarded-proto", "https, http")]);
        assert_eq!(request_scheme(&h), "https");
    }
}

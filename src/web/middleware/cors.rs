//! CORS middleware configuration.

use axum::http::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Methods the file API answers to.
const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Create a CORS layer from configuration.
///
/// `Content-Disposition` is exposed so browser clients can read the name of
/// a downloaded file. With no (valid) origins configured any origin is
/// allowed.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed_origins: Vec<HeaderValue> =
        origins.iter().filter_map(|o| o.parse().ok()).collect();

    let layer = CorsLayer::new()
        .allow_methods(METHODS)
        .expose_headers([CONTENT_DISPOSITION]);

    if parsed_origins.is_empty() {
        layer.allow_headers(Any).allow_origin(Any)
    } else {
        layer
            .allow_headers([CONTENT_TYPE, ACCEPT])
            .allow_origin(parsed_origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::util::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let origins = vec!["http://localhost:5173".to_string()];
        let app = Router::new()
            .route("/", get(dummy_handler))
            .layer(create_cors_layer(&origins));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get("access-control-expose-headers").unwrap(),
            "content-disposition"
        );
    }

    #[tokio::test]
    async fn test_cors_any_origin_when_unconfigured() {
        let app = Router::new()
            .route("/", get(dummy_handler))
            .layer(create_cors_layer(&["not a header\n".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}

use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Static hardening headers for JSON API responses.
///
/// Paths under `/media` serve stored images and may be embedded by the
/// front end, so they only get `nosniff`.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_media_route = req.uri().path().starts_with("/media");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );

    if is_media_route {
        return response;
    }

    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    response
}

//! Toprank response serialization and error formatting.

use toprank_model::TopRankError;

use crate::body::TopRankResponseBody;

/// Content type for Toprank JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header reporting whether the payload came from the cache (`hit`), a fresh
/// upstream call (`miss`) or bypassed an unreachable cache (`bypass`).
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Serialize a Toprank error into a JSON response body.
///
/// ```json
/// { "code": "ValidationError", "message": "invalid page 'abc': expected an integer >= 1" }
/// ```
#[must_use]
pub fn error_to_json(error: &TopRankError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "code": error.code.as_str(),
        "message": error.message,
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Convert a `TopRankError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(
    error: &TopRankError,
    request_id: &str,
) -> http::Response<TopRankResponseBody> {
    let json = error_to_json(error);
    let mut response = http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .body(TopRankResponseBody::from_json(json))
        .expect("valid error response");

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, hv);
    }

    response
}

/// Build a success response from JSON bytes.
///
/// `cache_status` is reported in the `x-cache` header when present.
#[must_use]
pub fn json_response(
    json: Vec<u8>,
    cache_status: Option<&str>,
) -> http::Response<TopRankResponseBody> {
    let mut response = http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .body(TopRankResponseBody::from_json(json))
        .expect("valid JSON response");

    if let Some(status) = cache_status {
        if let Ok(hv) = http::HeaderValue::from_str(status) {
            response.headers_mut().insert(CACHE_STATUS_HEADER, hv);
        }
    }

    response
}

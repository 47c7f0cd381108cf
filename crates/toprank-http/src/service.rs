//! Toprank HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::body::Incoming;

use crate::body::TopRankResponseBody;
use crate::dispatch::{TopRankHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response};
use crate::router::resolve_operation;

/// Hyper `Service` implementation for Toprank.
///
/// Wraps a [`TopRankHandler`] implementation and routes incoming HTTP
/// requests to the matching operation. Every response carries an
/// `x-request-id` header.
#[derive(Debug)]
pub struct TopRankHttpService<H: TopRankHandler> {
    handler: Arc<H>,
}

impl<H: TopRankHandler> TopRankHttpService<H> {
    /// Create a new `TopRankHttpService`.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }
}

impl<H: TopRankHandler> Clone for TopRankHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: TopRankHandler> hyper::service::Service<http::Request<Incoming>>
    for TopRankHttpService<H>
{
    type Response = http::Response<TopRankResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            // All routes are bodyless GETs; the request body is never read.
            let (parts, _incoming) = req.into_parts();
            let response =
                process_request(&parts.method, parts.uri.path(), handler.as_ref(), &request_id)
                    .await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process a single Toprank HTTP request through the full pipeline.
async fn process_request<H: TopRankHandler>(
    method: &http::Method,
    path: &str,
    handler: &H,
    request_id: &str,
) -> http::Response<TopRankResponseBody> {
    // 1. Route: resolve the operation from method and path.
    let op = match resolve_operation(method, path) {
        Ok(op) => op,
        Err(err) => {
            tracing::debug!(%method, path, error = %err, "request rejected by router");
            return error_to_response(&err, request_id);
        }
    };

    // 2. Dispatch to handler.
    match dispatch_operation(handler, op).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code.is_server_error() {
                tracing::error!(request_id, path, error = %err, "request failed");
            } else {
                tracing::debug!(request_id, path, error = %err, "request failed");
            }
            error_to_response(&err, request_id)
        }
    }
}

/// Add common response headers to every Toprank response.
fn add_common_headers(
    mut response: http::Response<TopRankResponseBody>,
    request_id: &str,
) -> http::Response<TopRankResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert("server", http::HeaderValue::from_static("Toprank"));

    // CORS headers.
    headers.insert(
        "access-control-allow-origin",
        http::HeaderValue::from_static("*"),
    );

    response
}

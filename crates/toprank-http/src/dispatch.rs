//! Toprank handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use toprank_model::{TopRankError, TopRankOperation};

use crate::body::TopRankResponseBody;

/// Trait that the Toprank business logic provider must implement.
///
/// The handler receives a resolved operation and returns a complete HTTP
/// response. This trait is the boundary between the HTTP transport layer and
/// the business logic layer.
pub trait TopRankHandler: Send + Sync + 'static {
    /// Handle a Toprank operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: TopRankOperation,
    ) -> Pin<
        Box<dyn Future<Output = Result<http::Response<TopRankResponseBody>, TopRankError>> + Send>,
    >;
}

/// Dispatch a Toprank operation to the handler.
pub async fn dispatch_operation<H: TopRankHandler>(
    handler: &H,
    op: TopRankOperation,
) -> Result<http::Response<TopRankResponseBody>, TopRankError> {
    tracing::debug!(operation = %op, "dispatching Toprank operation");
    handler.handle_operation(op).await
}

/// Default handler that returns an error for all operations.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl TopRankHandler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: TopRankOperation,
    ) -> Pin<
        Box<dyn Future<Output = Result<http::Response<TopRankResponseBody>, TopRankError>> + Send>,
    > {
        Box::pin(async move {
            Err(TopRankError::internal_error(format!(
                "operation {op} is not implemented"
            )))
        })
    }
}

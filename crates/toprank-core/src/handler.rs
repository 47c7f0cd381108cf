//! Toprank handler implementation bridging HTTP to the provider.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use toprank_http::body::TopRankResponseBody;
use toprank_http::dispatch::TopRankHandler;
use toprank_http::response::json_response;
use toprank_model::{TopRankError, TopRankOperation};

use crate::fetch::Fetched;
use crate::provider::TopRankProvider;

/// Handler that bridges the HTTP layer to the [`TopRankProvider`].
#[derive(Debug)]
pub struct TopRankRequestHandler {
    provider: Arc<TopRankProvider>,
}

impl TopRankRequestHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<TopRankProvider>) -> Self {
        Self { provider }
    }
}

impl TopRankHandler for TopRankRequestHandler {
    fn handle_operation(
        &self,
        op: TopRankOperation,
    ) -> Pin<
        Box<dyn Future<Output = Result<http::Response<TopRankResponseBody>, TopRankError>> + Send>,
    > {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(provider.as_ref(), op).await })
    }
}

/// Dispatch a Toprank operation to the matching provider method.
async fn dispatch(
    provider: &TopRankProvider,
    op: TopRankOperation,
) -> Result<http::Response<TopRankResponseBody>, TopRankError> {
    match op {
        TopRankOperation::ListCountries => serialize(&provider.list_countries().await?),
        TopRankOperation::GlobalSites { page } => serialize(&provider.global_sites(page).await?),
        TopRankOperation::CountrySites { country_code, page } => {
            serialize(&provider.country_sites(&country_code, page).await?)
        }
        TopRankOperation::Health => Ok(json_response(br#"{"status":"ok"}"#.to_vec(), None)),
    }
}

/// Serialize a fetched value into a JSON HTTP response.
fn serialize<T: Serialize>(
    fetched: &Fetched<T>,
) -> Result<http::Response<TopRankResponseBody>, TopRankError> {
    let json = serde_json::to_vec(&fetched.value)
        .map_err(|e| TopRankError::internal_error(format!("Failed to serialize response: {e}")))?;
    Ok(json_response(json, Some(fetched.outcome.as_str())))
}

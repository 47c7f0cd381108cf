//! Signed client for the upstream ranked-sites API.
//!
//! Each call builds the five query parameters of the `TopSites` action,
//! signs them with a fresh [`SigningContext`], and sends the request with the
//! canonical query string that was signed. The `host` value covered by the
//! signature is the regional signing host, which differs from the endpoint
//! the request is sent to.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use toprank_auth::{AuthError, Credentials, SignableRequest, SigningContext, sign};
use toprank_model::{Country, ResponseGroup, Site, TopRankError, TopRankResult, TopSitesQuery};

use crate::config::TopRankConfig;

/// Signing region of the upstream service.
pub const SERVICE_REGION: &str = "us-west-1";

/// Signing service name of the upstream service.
pub const SERVICE_NAME: &str = "AlexaTopSites";

/// Request path of the upstream service.
pub const SERVICE_URI: &str = "/api";

/// Content type requested from and announced to the upstream service.
const XML_CONTENT_TYPE: &str = "application/xml";

/// Source of ranked-sites records.
#[async_trait]
pub trait TopSitesSource: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch one page of ranked sites.
    async fn fetch_sites(&self, query: &TopSitesQuery) -> TopRankResult<Vec<Site>>;

    /// Fetch the list of countries.
    async fn fetch_countries(&self) -> TopRankResult<Vec<Country>>;
}

/// A fully signed upstream request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Absolute URL, whose query string is the signed canonical query.
    pub url: String,
    /// Headers to send, in order.
    pub headers: Vec<(&'static str, String)>,
    /// The canonical request that was signed, kept for diagnostics.
    pub canonical_request: String,
}

/// Client for the upstream ranked-sites API.
#[derive(Debug, Clone)]
pub struct TopSitesClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoint: String,
    signing_host: String,
}

impl TopSitesClient {
    /// Create a client from the service configuration.
    pub fn new(config: &TopRankConfig, credentials: Credentials) -> TopRankResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .map_err(|e| {
                TopRankError::configuration(format!("failed to build HTTP client: {e}"))
                    .with_source(e)
            })?;

        Ok(Self {
            http,
            credentials,
            endpoint: config.upstream_endpoint.trim_end_matches('/').to_owned(),
            signing_host: config.upstream_signing_host.clone(),
        })
    }

    /// Build and sign the request for `group` and `query` at instant `now`.
    pub fn prepare(
        &self,
        group: ResponseGroup,
        query: &TopSitesQuery,
        now: DateTime<Utc>,
    ) -> TopRankResult<PreparedRequest> {
        let ctx = SigningContext::new(&self.credentials, SERVICE_REGION, SERVICE_NAME, now)
            .map_err(auth_error)?;

        let params = query.query_params(group);
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let headers = [
            ("host", self.signing_host.as_str()),
            ("x-amz-date", ctx.amz_date()),
        ];

        let signed = sign(
            &SignableRequest {
                method: "GET",
                path: SERVICE_URI,
                query: &params,
                headers: &headers,
            },
            &ctx,
        )
        .map_err(auth_error)?;

        Ok(PreparedRequest {
            url: format!("{}{SERVICE_URI}?{}", self.endpoint, signed.canonical_query),
            headers: vec![
                ("Authorization", signed.authorization),
                ("Content-Type", XML_CONTENT_TYPE.to_owned()),
                ("X-Amz-Date", ctx.amz_date().to_owned()),
                ("Accept", XML_CONTENT_TYPE.to_owned()),
            ],
            canonical_request: signed.canonical_request,
        })
    }

    async fn execute(&self, group: ResponseGroup, query: &TopSitesQuery) -> TopRankResult<Bytes> {
        let prepared = self.prepare(group, query, Utc::now())?;

        let mut request = self.http.get(&prepared.url);
        for (name, value) in &prepared.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "upstream request timed out".to_owned()
            } else {
                format!("upstream request failed: {e}")
            };
            TopRankError::upstream(message).with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                %status,
                response_group = %group,
                body = %truncate(&body, 512),
                "upstream returned an error"
            );
            return Err(TopRankError::upstream(format!("upstream returned {status}")));
        }

        response.bytes().await.map_err(|e| {
            TopRankError::upstream(format!("failed to read upstream response: {e}")).with_source(e)
        })
    }
}

#[async_trait]
impl TopSitesSource for TopSitesClient {
    async fn fetch_sites(&self, query: &TopSitesQuery) -> TopRankResult<Vec<Site>> {
        let body = self.execute(ResponseGroup::Country, query).await?;
        Ok(toprank_xml::parse_sites(&body)?)
    }

    async fn fetch_countries(&self) -> TopRankResult<Vec<Country>> {
        let body = self
            .execute(ResponseGroup::ListCountries, &TopSitesQuery::country_list())
            .await?;
        Ok(toprank_xml::parse_countries(&body)?)
    }
}

/// Map a signing failure onto the service error taxonomy.
fn auth_error(err: AuthError) -> TopRankError {
    if err.is_configuration() {
        TopRankError::configuration(err.to_string()).with_source(err)
    } else {
        TopRankError::signing(err.to_string()).with_source(err)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

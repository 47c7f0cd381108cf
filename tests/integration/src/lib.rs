//! Integration tests for the Toprank server.
//!
//! Each test starts a fake upstream (a plain hyper server answering with
//! canned XML) and the real gateway stack on ephemeral ports, then talks to
//! the gateway over HTTP with `reqwest`. Nothing outside the process is
//! required.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;

use toprank_auth::Credentials;
use toprank_core::{
    CacheStore, FetchOrchestrator, InMemoryCacheStore, TopRankConfig, TopRankProvider,
    TopRankRequestHandler, TopSitesClient,
};
use toprank_http::TopRankHttpService;

#[cfg(test)]
mod test_cache;
#[cfg(test)]
mod test_errors;
#[cfg(test)]
mod test_gateway;

/// Access key the gateway signs with.
pub const ACCESS_KEY: &str = "AKIDEXAMPLE";

/// Secret key the gateway signs with.
pub const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// Host covered by the signature.
pub const SIGNING_HOST: &str = "ats.us-west-1.amazonaws.com";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A request received by the fake upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path and query.
    pub uri: String,
    /// `Authorization` header.
    pub authorization: Option<String>,
    /// `X-Amz-Date` header.
    pub amz_date: Option<String>,
    /// `Accept` header.
    pub accept: Option<String>,
}

impl RecordedRequest {
    /// The raw query string.
    #[must_use]
    pub fn query(&self) -> &str {
        self.uri.split_once('?').map_or("", |(_, q)| q)
    }

    /// Value of one query parameter, still percent-encoded.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query().split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }
}

#[derive(Debug)]
struct UpstreamState {
    status: http::StatusCode,
    body: String,
    requests: Vec<RecordedRequest>,
}

/// In-process stand-in for the ranked-sites API.
#[derive(Debug, Clone)]
pub struct FakeUpstream {
    addr: SocketAddr,
    state: Arc<Mutex<UpstreamState>>,
}

impl FakeUpstream {
    /// Start a fake upstream answering every request with `status` and `body`.
    pub async fn start(status: http::StatusCode, body: impl Into<String>) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");
        let state = Arc::new(Mutex::new(UpstreamState {
            status,
            body: body.into(),
            requests: Vec::new(),
        }));

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let service = service_fn(move |req| answer(Arc::clone(&state), req));
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, state }
    }

    /// Base URL to configure as the upstream endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Change the canned response.
    pub fn respond_with(&self, status: http::StatusCode, body: impl Into<String>) {
        let mut state = self.state.lock().expect("upstream state");
        state.status = status;
        state.body = body.into();
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("upstream state").requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.lock().expect("upstream state").requests.len()
    }
}

async fn answer(
    state: Arc<Mutex<UpstreamState>>,
    req: http::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };
    let recorded = RecordedRequest {
        uri: req.uri().to_string(),
        authorization: header("authorization"),
        amz_date: header("x-amz-date"),
        accept: header("accept"),
    };

    let (status, body) = {
        let mut state = state.lock().expect("upstream state");
        state.requests.push(recorded);
        (state.status, state.body.clone())
    };

    Ok(http::Response::builder()
        .status(status)
        .header("content-type", "application/xml")
        .body(Full::new(Bytes::from(body)))
        .expect("valid fake upstream response"))
}

/// Start the gateway against `upstream_endpoint` with an in-memory cache.
pub async fn spawn_gateway(upstream_endpoint: &str) -> (String, Arc<InMemoryCacheStore>) {
    let store = Arc::new(InMemoryCacheStore::new());
    let base_url =
        spawn_gateway_with_store(upstream_endpoint, Arc::clone(&store) as Arc<dyn CacheStore>)
            .await;
    (base_url, store)
}

/// Start the gateway against `upstream_endpoint` with the given cache store.
///
/// Returns the gateway base URL.
pub async fn spawn_gateway_with_store(
    upstream_endpoint: &str,
    store: Arc<dyn CacheStore>,
) -> String {
    init_tracing();

    let config = TopRankConfig::builder()
        .gateway_listen("127.0.0.1:0".into())
        .upstream_endpoint(upstream_endpoint.to_owned())
        .upstream_timeout_secs(5)
        .cache_ttl_secs(300)
        .page_size(100)
        .build();
    let credentials = Credentials::new(ACCESS_KEY, SECRET_KEY).expect("test credentials");
    let client = TopSitesClient::new(&config, credentials).expect("upstream client");
    let provider = TopRankProvider::new(
        Arc::new(client),
        FetchOrchestrator::new(store),
        config.cache_ttl_secs,
        config.page_size,
    );
    let handler = TopRankRequestHandler::new(Arc::new(provider));
    let service = TopRankHttpService::new(Arc::new(handler));

    let listener = TcpListener::bind(&config.gateway_listen)
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("gateway address");

    tokio::spawn(async move {
        let http = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
        while let Ok((stream, _)) = listener.accept().await {
            let http = http.clone();
            let svc = service.clone();
            tokio::spawn(async move {
                let _ = http.serve_connection(TokioIo::new(stream), svc).await;
            });
        }
    });

    format!("http://{addr}")
}

/// A `Country` response group with one site per URL, ranked in order.
#[must_use]
pub fn sites_xml(urls: &[&str]) -> String {
    let sites: String = urls
        .iter()
        .enumerate()
        .map(|(idx, url)| {
            let rank = idx + 1;
            format!(
                "<aws:Site>\
                   <aws:DataUrl>{url}</aws:DataUrl>\
                   <aws:Country>\
                     <aws:Rank>{rank}</aws:Rank>\
                     <aws:Reach><aws:PerMillion>{}</aws:PerMillion></aws:Reach>\
                     <aws:PageViews>\
                       <aws:PerMillion>{}</aws:PerMillion>\
                       <aws:PerUser>2.5</aws:PerUser>\
                     </aws:PageViews>\
                   </aws:Country>\
                   <aws:Global><aws:Rank>{}</aws:Rank></aws:Global>\
                 </aws:Site>",
                1000 / rank,
                2000 / rank,
                rank * 10
            )
        })
        .collect();
    envelope(&format!("<aws:Country><aws:Sites>{sites}</aws:Sites></aws:Country>"))
}

/// A `ListCountries` response group.
#[must_use]
pub fn countries_xml(countries: &[(&str, &str, u64)]) -> String {
    let body: String = countries
        .iter()
        .map(|(name, code, total)| {
            format!(
                "<aws:Country>\
                   <aws:Name>{name}</aws:Name>\
                   <aws:Code>{code}</aws:Code>\
                   <aws:TotalSites>{total}</aws:TotalSites>\
                 </aws:Country>"
            )
        })
        .collect();
    envelope(&format!("<aws:Countries>{body}</aws:Countries>"))
}

fn envelope(inner: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\
         <aws:TopSitesResponse xmlns:aws=\"http://ats.amazonaws.com/doc/2005-11-21\">\
           <aws:Response>\
             <aws:TopSitesResult><aws:Alexa>\
               <aws:TopSites>{inner}</aws:TopSites>\
             </aws:Alexa></aws:TopSitesResult>\
           </aws:Response>\
         </aws:TopSitesResponse>"
    )
}

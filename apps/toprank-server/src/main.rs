//! Toprank Server - signed, cached gateway in front of the ranked-sites API.
//!
//! Serves ranked sites and the country list as JSON. Every upstream call is
//! SigV4-signed; responses are cached per page with a fixed TTL.
//!
//! # Usage
//!
//! ```text
//! TOPRANK_ACCESS_KEY=... TOPRANK_SECRET_KEY=... toprank-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:3000` | Bind address |
//! | `TOPRANK_ACCESS_KEY` | *(required)* | Upstream access key (or `AWS_ALEX_TOP_SITES_ACCESS_KEY`) |
//! | `TOPRANK_SECRET_KEY` | *(required)* | Upstream secret key (or `AWS_ALEX_TOP_SITES_SECRET_ACCESS_KEY`) |
//! | `CACHE_URL` | `memory` | `memory` or a `redis://` URL |
//! | `CACHE_TTL_SECS` | `86400` | Cached response lifetime |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use toprank_auth::Credentials;
use toprank_core::{
    CacheStore, FetchOrchestrator, InMemoryCacheStore, RedisCacheStore, TopRankConfig,
    TopRankProvider, TopRankRequestHandler, TopSitesClient,
};
use toprank_http::TopRankHttpService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often the in-memory cache drops expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Select the cache backend named by `CACHE_URL`.
///
/// The in-memory store gets a background sweeper. A Redis server that cannot
/// be reached at startup is a fatal error.
async fn build_cache_store(config: &TopRankConfig) -> Result<Arc<dyn CacheStore>> {
    if config.uses_memory_cache() {
        let store = Arc::new(InMemoryCacheStore::new());
        spawn_sweeper(Arc::clone(&store), SWEEP_INTERVAL);
        info!(backend = "memory", "cache backend selected");
        return Ok(store);
    }

    let store = RedisCacheStore::connect(&config.cache_url, config.cache_timeout())
        .await
        .context("failed to connect to the cache named by CACHE_URL")?;
    info!(backend = "redis", "cache backend selected");
    Ok(Arc::new(store))
}

/// Periodically purge expired entries from the in-memory store.
fn spawn_sweeper(
    store: Arc<InMemoryCacheStore>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = store.len(), "purged expired cache entries");
            }
        }
    })
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(
    listener: TcpListener,
    service: TopRankHttpService<TopRankRequestHandler>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"ok\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = TopRankConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = TopRankConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        upstream_endpoint = %config.upstream_endpoint,
        cache_ttl_secs = config.cache_ttl_secs,
        page_size = config.page_size,
        version = VERSION,
        "starting Toprank Server",
    );

    // Credentials are checked before anything touches the network.
    let credentials = Credentials::from_env().context("upstream credentials are not configured")?;
    info!(access_key = %credentials.access_key(), "loaded upstream credentials");

    let client =
        TopSitesClient::new(&config, credentials).context("failed to build upstream client")?;
    let store = build_cache_store(&config).await?;
    let provider = TopRankProvider::new(
        Arc::new(client),
        FetchOrchestrator::new(store),
        config.cache_ttl_secs,
        config.page_size,
    );
    let handler = TopRankRequestHandler::new(Arc::new(provider));
    let service = TopRankHttpService::new(Arc::new(handler));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}

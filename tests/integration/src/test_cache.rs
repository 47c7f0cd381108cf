//! End-to-end tests for cache degradation.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use http::StatusCode;
    use toprank_core::{CacheError, CacheStore, InMemoryCacheStore};

    use crate::{FakeUpstream, sites_xml, spawn_gateway, spawn_gateway_with_store};

    /// A store whose server is down.
    #[derive(Debug)]
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_owned()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_owned()))
        }

        async fn expire(&self, _key: &str, _ttl_secs: u64) -> Result<bool, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_owned()))
        }

        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: String,
            _ttl_secs: u64,
        ) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_owned()))
        }

        fn backend(&self) -> &'static str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_should_serve_live_data_when_cache_is_down() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let base = spawn_gateway_with_store(&upstream.endpoint(), Arc::new(DownStore)).await;

        for _ in 0..3 {
            let response = reqwest::get(format!("{base}/global/1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-cache"], "bypass");
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body[0]["url"], "example.com");
        }

        assert_eq!(upstream.request_count(), 3);
    }

    #[tokio::test]
    async fn test_should_replace_unreadable_cache_entry() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let store = Arc::new(InMemoryCacheStore::new());
        store
            .set_with_ttl("top-sites-global-1", "{not json".to_owned(), 60)
            .await
            .unwrap();
        let shared: Arc<dyn CacheStore> = Arc::clone(&store) as Arc<dyn CacheStore>;
        let base = spawn_gateway_with_store(&upstream.endpoint(), shared).await;

        let first = reqwest::get(format!("{base}/global/1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-cache"], "bypass");

        let second = reqwest::get(format!("{base}/global/1")).await.unwrap();
        assert_eq!(second.headers()["x-cache"], "hit");
        assert_eq!(upstream.request_count(), 1);
    }

    #[tokio::test]
    async fn test_should_store_entries_under_documented_keys() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let (base, store) = spawn_gateway(&upstream.endpoint()).await;

        reqwest::get(format!("{base}/global/4")).await.unwrap();
        reqwest::get(format!("{base}/JP/2")).await.unwrap();

        assert!(store.get("top-sites-global-4").await.unwrap().is_some());
        assert!(store.get("top-sites-jp-2").await.unwrap().is_some());
        assert_eq!(store.len(), 2);
    }
}

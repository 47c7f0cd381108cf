//! End-to-end tests for rejected requests and upstream failures.

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::{FakeUpstream, sites_xml, spawn_gateway};

    async fn error_body(response: reqwest::Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_should_reject_invalid_page() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&[])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        for path in ["/global/0", "/global/abc", "/fr/-1"] {
            let response = reqwest::get(format!("{base}{path}")).await.unwrap();
            let (status, body) = error_body(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body["code"], "ValidationError", "{path}");
        }
        assert_eq!(upstream.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_country_code() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&[])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        for path in ["/fra/1", "/f1/1", "/x/1"] {
            let response = reqwest::get(format!("{base}{path}")).await.unwrap();
            let (status, body) = error_body(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert!(
                body["message"]
                    .as_str()
                    .unwrap()
                    .contains("invalid country code"),
                "{path}"
            );
        }
        assert_eq!(upstream.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_unknown_path() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&[])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        for path in ["/", "/global", "/fr/1/extra"] {
            let response = reqwest::get(format!("{base}{path}")).await.unwrap();
            let (status, body) = error_body(response).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body["code"], "NotFound", "{path}");
        }
    }

    #[tokio::test]
    async fn test_should_reject_non_get_methods() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&[])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/global/1"))
            .send()
            .await
            .unwrap();
        let (status, body) = error_body(response).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], "MethodNotAllowed");
        assert_eq!(upstream.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_map_upstream_failure_to_bad_gateway_without_caching() {
        let upstream = FakeUpstream::start(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<Response><Errors><Error><Code>InternalFailure</Code></Error></Errors></Response>",
        )
        .await;
        let (base, store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::get(format!("{base}/global/1")).await.unwrap();
        let (status, body) = error_body(response).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "UpstreamError");
        assert!(store.is_empty());

        // The failure is not cached: the next call goes upstream again.
        upstream.respond_with(StatusCode::OK, sites_xml(&["example.com"]));
        let response = reqwest::get(format!("{base}/global/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "miss");
        assert_eq!(upstream.request_count(), 2);
    }

    #[tokio::test]
    async fn test_should_map_malformed_xml_to_parse_error() {
        let upstream = FakeUpstream::start(StatusCode::OK, "<aws:TopSitesResponse><oops").await;
        let (base, store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::get(format!("{base}/global/1")).await.unwrap();
        let (status, body) = error_body(response).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "ParseError");
        assert!(store.is_empty());
    }
}

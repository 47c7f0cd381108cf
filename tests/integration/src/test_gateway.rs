//! End-to-end tests for the happy paths: routing, signing, caching and JSON shape.

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, Utc};
    use http::StatusCode;
    use toprank_auth::{Credentials, SignableRequest, SigningContext, sign};

    use crate::{
        ACCESS_KEY, FakeUpstream, SECRET_KEY, SIGNING_HOST, countries_xml, sites_xml,
        spawn_gateway,
    };

    #[tokio::test]
    async fn test_should_serve_country_sites_then_hit_cache() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["lemonde.fr", "orange.fr"]))
            .await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        let first = reqwest::get(format!("{base}/FR/1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-cache"], "miss");
        assert_eq!(first.headers()["content-type"], "application/json");
        assert!(first.headers().contains_key("x-request-id"));

        let body: serde_json::Value = first.json().await.unwrap();
        let sites = body.as_array().unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0]["url"], "lemonde.fr");
        assert_eq!(
            sites[0]["favicon"],
            "https://plus.google.com/_/favicon?domain=lemonde.fr"
        );
        assert_eq!(sites[0]["country"]["rank"], 1);
        assert_eq!(sites[0]["country"]["reach"]["perMillion"], 1000.0);
        assert_eq!(sites[0]["country"]["pageViews"]["perUser"], 2.5);
        assert_eq!(sites[1]["global"]["rank"], 20);

        let second = reqwest::get(format!("{base}/fr/1")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()["x-cache"], "hit");
        let cached: serde_json::Value = second.json().await.unwrap();
        assert_eq!(cached, body);

        assert_eq!(upstream.request_count(), 1);
        let request = &upstream.requests()[0];
        assert_eq!(request.param("Action"), Some("TopSites"));
        assert_eq!(request.param("CountryCode"), Some("fr"));
        assert_eq!(request.param("ResponseGroup"), Some("Country"));
        assert_eq!(request.param("Start"), Some("1"));
        assert_eq!(request.param("Count"), Some("100"));
        assert_eq!(request.accept.as_deref(), Some("application/xml"));
    }

    #[tokio::test]
    async fn test_should_page_global_sites() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let (base, store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::get(format!("{base}/global/2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = &upstream.requests()[0];
        assert_eq!(request.param("Start"), Some("101"));
        assert_eq!(request.param("CountryCode"), Some(""));
        assert!(request.query().contains("&CountryCode=&"));

        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_should_cache_pages_under_separate_keys() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        for path in ["/global/1", "/global/2", "/us/1", "/global/1"] {
            let response = reqwest::get(format!("{base}{path}")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }

        assert_eq!(upstream.request_count(), 3);
    }

    #[tokio::test]
    async fn test_should_list_countries() {
        let upstream = FakeUpstream::start(
            StatusCode::OK,
            countries_xml(&[("France", "FR", 1_234), ("Japan", "JP", 5_678)]),
        )
        .await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::get(format!("{base}/countries")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body,
            serde_json::json!([
                { "name": "France", "code": "FR", "totalSites": 1234 },
                { "name": "Japan", "code": "JP", "totalSites": 5678 },
            ])
        );

        let request = &upstream.requests()[0];
        assert_eq!(request.param("ResponseGroup"), Some("ListCountries"));
    }

    #[tokio::test]
    async fn test_should_answer_health_without_upstream() {
        let upstream = FakeUpstream::start(StatusCode::OK, "").await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(upstream.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_send_verifiable_signature() {
        let upstream = FakeUpstream::start(StatusCode::OK, sites_xml(&["example.com"])).await;
        let (base, _store) = spawn_gateway(&upstream.endpoint()).await;

        reqwest::get(format!("{base}/de/3")).await.unwrap();
        let request = upstream.requests().remove(0);

        let amz_date = request.amz_date.clone().unwrap();
        let now = NaiveDateTime::parse_from_str(&amz_date, "%Y%m%dT%H%M%SZ")
            .unwrap()
            .and_utc();
        assert!((Utc::now() - now).num_minutes().abs() < 5);

        let params: Vec<(&str, &str)> = request
            .query()
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect();
        let credentials = Credentials::new(ACCESS_KEY, SECRET_KEY).unwrap();
        let ctx = SigningContext::new(&credentials, "us-west-1", "AlexaTopSites", now).unwrap();
        let headers = [("host", SIGNING_HOST), ("x-amz-date", amz_date.as_str())];
        let expected = sign(
            &SignableRequest {
                method: "GET",
                path: "/api",
                query: &params,
                headers: &headers,
            },
            &ctx,
        )
        .unwrap();

        assert_eq!(expected.canonical_query, request.query());
        assert_eq!(
            request.authorization.as_deref(),
            Some(expected.authorization.as_str())
        );
        assert!(
            expected
                .authorization
                .contains("/us-west-1/AlexaTopSites/aws4_request, SignedHeaders=host;x-amz-date,")
        );
    }
}

//! Hypixel API client
//!
//! Every request goes through the shared [`Throttle`] and may carry a key
//! from the [`KeyPool`]. Failures never escape [`HypixelClient::get`]; the
//! typed [`HypixelClient::fetch`] is there for callers that need to inspect
//! the failure (e.g. to dump an unparseable body).

use crate::error::{FetchError, Result};
use crate::key_pool::KeyPool;
use crate::throttle::Throttle;
use crate::types::BAZAAR_PATH;
use flipper_core::FlipperConfig;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Header used when the key is sent out of band
pub const API_KEY_HEADER: &str = "API-Key";

/// How a request is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Public resource endpoints
    None,
    /// `key=<value>` query parameter
    Query,
    /// `API-Key` header
    Header,
}

/// Hypixel API client
#[derive(Clone)]
pub struct HypixelClient {
    client: Client,
    base_url: String,
    keys: Arc<KeyPool>,
    throttle: Arc<Throttle>,
}

impl HypixelClient {
    /// Create a client with the configured base URL and timeouts
    pub fn new(config: &FlipperConfig, keys: Arc<KeyPool>, throttle: Arc<Throttle>) -> Result<Self> {
        Self::with_timeouts(
            &config.api_base_url,
            config.connect_timeout,
            config.request_timeout,
            keys,
            throttle,
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        keys: Arc<KeyPool>,
        throttle: Arc<Throttle>,
    ) -> Result<Self> {
        // Validate once so per-request URL building only fails on bad paths
        Url::parse(base_url).map_err(|e| FetchError::Url(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("skyblock-flipper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            keys,
            throttle,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn keys(&self) -> &Arc<KeyPool> {
        &self.keys
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    fn build_url(&self, path: &str, params: &[(&str, String)], key: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| FetchError::Url(format!("{}{}: {}", self.base_url, path, e)))?;

        let mut pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if let Some(key) = key {
            pairs.push(("key", key));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// GET `path` and return the parsed JSON object
    #[instrument(skip(self, params))]
    pub async fn fetch(&self, path: &str, params: &[(&str, String)], mode: KeyMode) -> Result<Value> {
        let key = match mode {
            KeyMode::None => None,
            KeyMode::Query | KeyMode::Header => {
                let key = self.keys.next();
                if key.is_none() {
                    warn!("[Hypixel] No API key available for {}, sending unauthenticated", path);
                }
                key
            }
        };

        let query_key = if mode == KeyMode::Query { key.as_deref() } else { None };
        let url = self.build_url(path, params, query_key)?;

        debug!("[Hypixel] GET {} params={:?} mode={:?}", path, params, mode);

        let _permit = self.throttle.acquire().await?;

        let mut request = self.client.get(url);
        if let (KeyMode::Header, Some(key)) = (mode, key.as_deref()) {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(format!("Failed to read body from {}: {}", path, e)))?;

        if !body.trim_start().starts_with('{') {
            return Err(FetchError::NotJson {
                path: path.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Parse {
            path: path.to_string(),
            message: e.to_string(),
            body,
        })
    }

    /// Soft-failing GET: logs the failure and returns `None`
    pub async fn get(&self, path: &str, params: &[(&str, String)], mode: KeyMode) -> Option<Value> {
        match self.fetch(path, params, mode).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[Hypixel] {}", e);
                None
            }
        }
    }

    /// Unauthenticated check against the bazaar endpoint
    pub async fn is_healthy(&self) -> bool {
        self.get(BAZAAR_PATH, &[], KeyMode::None)
            .await
            .is_some_and(|payload| {
                payload.get("success").and_then(Value::as_bool) == Some(true)
                    || payload.get("products").is_some_and(Value::is_object)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, keys: Vec<String>) -> HypixelClient {
        HypixelClient::with_timeouts(
            &server.uri(),
            Duration::from_secs(5),
            Duration::from_secs(10),
            Arc::new(KeyPool::from_keys(keys, 110)),
            Arc::new(Throttle::new(4, Duration::ZERO)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_key_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/skyblock/auctions"))
            .and(query_param("key", "abc"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, vec!["abc".to_string()]);
        let value = client
            .get("/v2/skyblock/auctions", &[("page", "2".to_string())], KeyMode::Query)
            .await;
        assert_eq!(value, Some(json!({ "success": true })));
    }

    #[tokio::test]
    async fn test_header_key_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/skyblock/bazaar"))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, vec!["secret".to_string()]);
        let value = client.fetch("/v2/skyblock/bazaar", &[], KeyMode::Header).await;
        assert!(value.is_ok());
    }

    #[tokio::test]
    async fn test_empty_pool_sends_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/skyblock/bazaar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        assert!(client.get("/v2/skyblock/bazaar", &[], KeyMode::Query).await.is_some());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn test_non_200_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        let err = client.fetch("/v2/skyblock/bazaar", &[], KeyMode::None).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert!(client.get("/v2/skyblock/bazaar", &[], KeyMode::None).await.is_none());
    }

    #[tokio::test]
    async fn test_non_object_body_keeps_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>cloudflare</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        let err = client.fetch("/v2/skyblock/bazaar", &[], KeyMode::None).await.unwrap_err();
        assert!(matches!(err, FetchError::NotJson { .. }));
        assert_eq!(err.raw_body(), Some("<html>cloudflare</html>"));
    }

    #[tokio::test]
    async fn test_truncated_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"success\": tr"))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        let err = client.fetch("/v2/skyblock/bazaar", &[], KeyMode::None).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/skyblock/bazaar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false, "products": {} })))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        assert!(client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_health_check_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, vec![]);
        assert!(!client.is_healthy().await);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HypixelClient::with_timeouts(
            "not a url",
            Duration::from_secs(1),
            Duration::from_secs(1),
            Arc::new(KeyPool::default()),
            Arc::new(Throttle::new(1, Duration::ZERO)),
        );
        assert!(matches!(result, Err(FetchError::Url(_))));
    }
}

//! HTTP client for the NGINX Plus API.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::error::NginxError;
use crate::types::{UpstreamPeerSet, UpstreamRef};

/// API version segment used in request paths.
pub const DEFAULT_API_VERSION: u32 = 4;

/// Connect and read timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only NGINX Plus API client.
#[derive(Debug, Clone)]
pub struct NginxClient {
    client: reqwest::Client,
    base_url: String,
    api_version: u32,
}

impl NginxClient {
    /// Create a client for the API rooted at `base_url` (e.g. `http://lb:8080/api`).
    pub fn new(base_url: &str, api_version: u32, timeout: Duration) -> Result<Self, NginxError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(NginxError::InvalidUrl {
                url: base_url.to_string(),
                reason: "Empty NGINX Plus API url is not allowed".to_string(),
            });
        }

        let parsed = reqwest::Url::parse(trimmed).map_err(|e| NginxError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NginxError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NginxError::Client)?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
            api_version,
        })
    }

    /// Versioned API root, e.g. `http://lb:8080/api/4`.
    pub fn api_url(&self) -> String {
        format!("{}/{}", self.base_url, self.api_version)
    }

    /// Full URL of an upstream.
    pub fn upstream_url(&self, upstream: &UpstreamRef) -> String {
        format!("{}{}", self.api_url(), upstream.path())
    }

    /// Check the API root answers with 200.
    pub async fn check_api(&self) -> Result<(), NginxError> {
        let url = self.api_url();
        let response = self.send(&url).await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NginxError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Fetch the peer set of an upstream.
    pub async fn peers(&self, upstream: &UpstreamRef) -> Result<UpstreamPeerSet, NginxError> {
        let url = self.upstream_url(upstream);
        debug!(url = %url, "Fetching upstream peers");

        let response = self.send(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(NginxError::UpstreamNotFound(upstream.name.clone()));
        }

        let body = response.text().await.map_err(|source| NginxError::Request {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(NginxError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let peers: UpstreamPeerSet =
            serde_json::from_str(&body).map_err(|source| NginxError::Decode {
                upstream: upstream.name.clone(),
                body,
                source,
            })?;

        debug!(upstream = %upstream, peers = peers.len(), "Fetched upstream peers");
        Ok(peers)
    }

    /// Fail with [`NginxError::UpstreamNotFound`] if the upstream is not configured.
    pub async fn check_upstream_exists(&self, upstream: &UpstreamRef) -> Result<(), NginxError> {
        self.peers(upstream).await.map(|_| ())
    }

    /// `server` addresses of the upstream's peers.
    pub async fn servers(&self, upstream: &UpstreamRef) -> Result<Vec<String>, NginxError> {
        let peers = self.peers(upstream).await?;
        Ok(peers.peers.into_iter().map(|p| p.server).collect())
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, NginxError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|source| NginxError::Request {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> NginxClient {
        NginxClient::new(
            &format!("{}/api/", server.uri()),
            DEFAULT_API_VERSION,
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = NginxClient::new("http://lb:8080/api/", 4, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.api_url(), "http://lb:8080/api/4");
        assert_eq!(
            client.upstream_url(&UpstreamRef::stream("tcp-backend")),
            "http://lb:8080/api/4/stream/upstreams/tcp-backend"
        );
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            NginxClient::new("", 4, DEFAULT_TIMEOUT),
            Err(NginxError::InvalidUrl { .. })
        ));
        assert!(NginxClient::new("not a url", 4, DEFAULT_TIMEOUT).is_err());
        assert!(NginxClient::new("ftp://lb/api", 4, DEFAULT_TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn test_fetch_peers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/4/http/upstreams/backend1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "peers": [
                    {"id": 0, "server": "10.0.0.1:80"},
                    {"id": 1, "server": "10.0.0.2:80"}
                ],
                "zone": "backend1"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let upstream = UpstreamRef::http("backend1");

        let peers = client.peers(&upstream).await.unwrap();
        assert_eq!(peers.len(), 2);

        let servers = client.servers(&upstream).await.unwrap();
        assert_eq!(servers, vec!["10.0.0.1:80", "10.0.0.2:80"]);
    }

    #[tokio::test]
    async fn test_missing_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/4/stream/upstreams/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"status": 404, "text": "upstream not found", "code": "UpstreamNotFound"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .check_upstream_exists(&UpstreamRef::stream("nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, NginxError::UpstreamNotFound(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "Upstream nope is not found");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/4/http/upstreams/backend1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .peers(&UpstreamRef::http("backend1"))
            .await
            .unwrap_err();

        match err {
            NginxError::Decode { upstream, body, .. } => {
                assert_eq!(upstream, "backend1");
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/4/http/upstreams/backend1"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .peers(&UpstreamRef::http("backend1"))
            .await
            .unwrap_err();

        assert!(matches!(err, NginxError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_check_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["nginx", "http"])))
            .mount(&server)
            .await;

        client_for(&server).check_api().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        // Nothing listens on port 9 (discard) in the test environment.
        let client = NginxClient::new("http://127.0.0.1:9/api", 4, Duration::from_secs(2)).unwrap();
        let err = client
            .peers(&UpstreamRef::http("backend1"))
            .await
            .unwrap_err();

        assert!(err.is_network());
    }
}

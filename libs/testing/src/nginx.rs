//! NGINX Plus API mock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nasg_nginx::UpstreamRef;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::scaling::FakeScalingApi;

/// API prefix the mock serves under.
const API_PREFIX: &str = "/api";

/// Build an upstream document with `count` peers.
pub fn peer_document(upstream: &str, count: usize) -> Value {
    let peers: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "server": format!("10.0.{}.{}:80", i / 250, i % 250 + 1),
                "name": format!("10.0.{}.{}:80", i / 250, i % 250 + 1),
                "backup": false,
                "weight": 1,
                "state": "up",
            })
        })
        .collect();

    json!({
        "peers": peers,
        "keepalive": 0,
        "zombies": 0,
        "zone": upstream,
    })
}

/// Replays a list of peer counts, repeating the last one.
struct PeerSequence {
    upstream: String,
    counts: Vec<usize>,
    calls: AtomicUsize,
}

impl Respond for PeerSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self
            .counts
            .get(n)
            .or_else(|| self.counts.last())
            .copied()
            .unwrap_or(0);
        ResponseTemplate::new(200).set_body_json(peer_document(&self.upstream, count))
    }
}

/// Reports as many peers as a fake group has `InService` members, the way
/// the sync agent would after its next pass.
struct MirrorGroup {
    upstream: String,
    group: String,
    scaling: Arc<FakeScalingApi>,
}

impl Respond for MirrorGroup {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.scaling.in_service(&self.group).unwrap_or(0) as usize;
        ResponseTemplate::new(200).set_body_json(peer_document(&self.upstream, count))
    }
}

/// A running NGINX Plus API mock.
pub struct NginxMock {
    server: MockServer,
    api_version: u32,
}

impl NginxMock {
    /// Start a mock answering the versioned API root with 200.
    pub async fn start(api_version: u32) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{API_PREFIX}/{api_version}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(["nginx", "processes", "connections", "http", "stream"])),
            )
            .mount(&server)
            .await;

        Self {
            server,
            api_version,
        }
    }

    /// Base URL to hand to the client (without the version segment).
    pub fn api_url(&self) -> String {
        format!("{}{API_PREFIX}", self.server.uri())
    }

    fn upstream_path(&self, upstream: &UpstreamRef) -> String {
        format!("{API_PREFIX}/{}{}", self.api_version, upstream.path())
    }

    /// Serve the given peer counts in order, then keep serving the last one.
    pub async fn serve_peer_counts(&self, upstream: &UpstreamRef, counts: Vec<usize>) {
        Mock::given(method("GET"))
            .and(path(self.upstream_path(upstream)))
            .respond_with(PeerSequence {
                upstream: upstream.name.clone(),
                counts,
                calls: AtomicUsize::new(0),
            })
            .mount(&self.server)
            .await;
    }

    /// Serve one peer per `InService` member of `group` in `scaling`.
    pub async fn mirror_group(
        &self,
        upstream: &UpstreamRef,
        group: &str,
        scaling: Arc<FakeScalingApi>,
    ) {
        Mock::given(method("GET"))
            .and(path(self.upstream_path(upstream)))
            .respond_with(MirrorGroup {
                upstream: upstream.name.clone(),
                group: group.to_string(),
                scaling,
            })
            .mount(&self.server)
            .await;
    }

    /// Answer an upstream with a fixed body and status.
    pub async fn serve_raw(&self, upstream: &UpstreamRef, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(self.upstream_path(upstream)))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for an upstream.
    pub async fn upstream_requests(&self, upstream: &UpstreamRef) -> usize {
        let wanted = self.upstream_path(upstream);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .count()
    }
}

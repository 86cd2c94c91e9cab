//! Upstream and peer types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which NGINX module owns the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamKind {
    Http,
    Stream,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpstreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "stream" => Ok(Self::Stream),
            other => Err(format!(
                "invalid upstream kind '{other}', expected http or stream"
            )),
        }
    }
}

/// A named upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpstreamRef {
    pub kind: UpstreamKind,
    pub name: String,
}

impl UpstreamRef {
    pub fn new(kind: UpstreamKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn http(name: impl Into<String>) -> Self {
        Self::new(UpstreamKind::Http, name)
    }

    pub fn stream(name: impl Into<String>) -> Self {
        Self::new(UpstreamKind::Stream, name)
    }

    /// API path below the version segment, e.g. `/http/upstreams/backend1`.
    pub fn path(&self) -> String {
        format!("/{}/upstreams/{}", self.kind, self.name)
    }
}

impl fmt::Display for UpstreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One upstream server as reported by the API.
///
/// Only `id` and `server` are named; everything else NGINX reports is kept
/// as-is so it can be echoed back in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default)]
    pub server: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Peer {
    pub fn new(id: u64, server: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            server: server.into(),
            state: Some("up".to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

/// The upstream document returned by `GET .../upstreams/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPeerSet {
    pub peers: Vec<Peer>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UpstreamPeerSet {
    pub fn new(peers: Vec<Peer>) -> Self {
        Self {
            peers,
            extra: serde_json::Map::new(),
        }
    }

    /// Number of peers; the only attribute convergence looks at.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// `server` addresses of all peers.
    pub fn servers(&self) -> Vec<&str> {
        self.peers.iter().map(|p| p.server.as_str()).collect()
    }

    /// Peers rendered as compact JSON, for failure messages.
    pub fn peers_json(&self) -> String {
        serde_json::to_string(&self.peers).unwrap_or_else(|_| format!("{:?}", self.peers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_paths() {
        assert_eq!(
            UpstreamRef::http("backend1").path(),
            "/http/upstreams/backend1"
        );
        assert_eq!(
            UpstreamRef::stream("tcp-backend").to_string(),
            "/stream/upstreams/tcp-backend"
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("http".parse::<UpstreamKind>(), Ok(UpstreamKind::Http));
        assert_eq!("stream".parse::<UpstreamKind>(), Ok(UpstreamKind::Stream));
        assert!("tcp".parse::<UpstreamKind>().is_err());
    }

    #[test]
    fn test_decode_keeps_unknown_fields() {
        let set: UpstreamPeerSet = serde_json::from_str(
            r#"{
                "peers": [
                    {"id": 0, "server": "10.0.0.1:80", "state": "up", "weight": 1},
                    {"id": 1, "server": "10.0.0.2:80", "state": "unhealthy"}
                ],
                "keepalive": 0,
                "zone": "backend1"
            }"#,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.servers(), vec!["10.0.0.1:80", "10.0.0.2:80"]);
        assert_eq!(set.peers[0].extra["weight"], 1);
        assert_eq!(set.extra["zone"], "backend1");
    }

    #[test]
    fn test_decode_requires_peers() {
        let err = serde_json::from_str::<UpstreamPeerSet>(r#"{"zone": "x"}"#);
        assert!(err.is_err());
    }
}

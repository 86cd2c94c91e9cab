//! NGINX Plus API client.
//!
//! Reads upstream state from the NGINX Plus REST API:
//!
//! - `GET /<version>/` to check the API is reachable
//! - `GET /<version>/http/upstreams/<name>` for HTTP upstreams
//! - `GET /<version>/stream/upstreams/<name>` for TCP/UDP upstreams

mod client;
mod error;
mod types;

pub use client::{NginxClient, DEFAULT_API_VERSION, DEFAULT_TIMEOUT};
pub use error::NginxError;
pub use types::{Peer, UpstreamKind, UpstreamPeerSet, UpstreamRef};

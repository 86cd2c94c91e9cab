//! Final peer count check.

use nasg_nginx::{NginxClient, UpstreamPeerSet, UpstreamRef};
use tracing::{error, info};

use crate::error::SmokeError;

/// Read `upstream` once and require exactly `capacity` peers.
pub async fn assert_peer_count(
    nginx: &NginxClient,
    upstream: &UpstreamRef,
    capacity: u32,
) -> Result<UpstreamPeerSet, SmokeError> {
    let peers = nginx.peers(upstream).await?;

    if peers.len() != capacity as usize {
        error!(
            upstream = %upstream,
            expected = capacity,
            found = peers.len(),
            "Peer count mismatch"
        );
        return Err(SmokeError::PeerCountMismatch {
            upstream: upstream.to_string(),
            expected: capacity,
            found: peers.len(),
            peers: peers.peers_json(),
        });
    }

    info!(upstream = %upstream, peers = peers.len(), "Peer count matches");
    Ok(peers)
}

//! Load-balancer-side convergence: wait for the upstream peer count.

use nasg_nginx::{NginxClient, UpstreamRef};
use nasg_reconcile::{poll_until, ConvergenceStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SmokeError;
use crate::settings::SmokeSettings;

/// How the peer wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerWait {
    #[serde(serialize_with = "serialize_status")]
    pub status: ConvergenceStatus,

    /// Extra reads after the first one.
    pub rounds: u32,

    /// Peer count of the last read.
    pub last_count: usize,
}

fn serialize_status<S: serde::Serializer>(
    status: &ConvergenceStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}

/// Poll `upstream` until it reports `capacity` peers or the rounds run out.
///
/// Running out of rounds is reported in the returned [`PeerWait`], not as an
/// error; the final assertion decides. Request and decode errors propagate.
pub async fn wait_for_peers(
    nginx: &NginxClient,
    upstream: &UpstreamRef,
    capacity: u32,
    settings: &SmokeSettings,
) -> Result<PeerWait, SmokeError> {
    let expected = capacity as usize;

    let outcome = poll_until(
        settings.peer_budget(),
        || async move { nginx.peers(upstream).await.map(|p| p.len()) },
        |count| *count == expected,
    )
    .await?;

    let wait = PeerWait {
        status: outcome.status,
        rounds: outcome.rounds,
        last_count: outcome.value,
    };

    if wait.status.is_converged() {
        info!(
            upstream = %upstream,
            peers = wait.last_count,
            rounds = wait.rounds,
            "Upstream converged"
        );
    } else {
        warn!(
            upstream = %upstream,
            expected,
            peers = wait.last_count,
            rounds = wait.rounds,
            "Upstream did not converge, deferring to final check"
        );
    }

    Ok(wait)
}

//! Error type for the convergence checks.

use nasg_autoscaling::ScalingError;
use nasg_nginx::NginxError;
use nasg_reconcile::WaiterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("No Auto Scaling group name contains {0}")]
    GroupNotResolved(String),

    #[error("Failed to scale the group {group}")]
    ScaleAttemptsExhausted {
        group: String,
        attempts: u32,
        #[source]
        last: Option<ScalingError>,
    },

    #[error("Expected {expected} servers, found: {peers}")]
    PeerCountMismatch {
        upstream: String,
        expected: u32,
        found: usize,
        peers: String,
    },

    #[error("Scenario file {path}: {message}")]
    ScenarioFile { path: String, message: String },

    #[error(transparent)]
    Scaling(#[from] ScalingError),

    #[error(transparent)]
    Nginx(#[from] NginxError),

    #[error(transparent)]
    Waiter(#[from] WaiterError),
}

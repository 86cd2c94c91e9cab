//! Error handling and display for the CLI.

use colored::Colorize;
use nasg_autoscaling::ScalingError;
use nasg_nginx::NginxError;
use nasg_smoke::SmokeError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    #[error("Preflight failed for {failed} of {total} scenarios")]
    PreflightFailed { failed: usize, total: usize },
}

const NETWORK_HINT: &str = "Hint: Check the NGINX Plus API url (--nginx-api or NGINX_API).";
const AWS_HINT: &str = "Hint: Check your AWS credentials and the --aws-region/--aws-profile flags.";
const GROUPS_HINT: &str = "Hint: Run `nasg-smoke groups` to list the visible Auto Scaling groups.";

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", hint.yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(e) = err.downcast_ref::<SmokeError>() {
        return match e {
            SmokeError::Nginx(e) => nginx_hint(e),
            SmokeError::Scaling(e) => scaling_hint(e),
            SmokeError::ScaleAttemptsExhausted { .. } => Some(
                "Hint: Another scaling activity kept the group busy. Retry once it settles.",
            ),
            SmokeError::GroupNotResolved(_) => Some(GROUPS_HINT),
            SmokeError::Waiter(_) => Some(
                "Hint: Instances did not come into service in time. Check the group's activity history.",
            ),
            SmokeError::PeerCountMismatch { .. } => Some(
                "Hint: Check that the sync agent is running and its config lists this group.",
            ),
            _ => None,
        };
    }
    if let Some(e) = err.downcast_ref::<NginxError>() {
        return nginx_hint(e);
    }
    if let Some(e) = err.downcast_ref::<ScalingError>() {
        return scaling_hint(e);
    }
    if let Some(CliError::ScenariosFailed { .. }) = err.downcast_ref::<CliError>() {
        return Some("Hint: Rerun with RUST_LOG=debug to see every polling round.");
    }
    None
}

fn nginx_hint(err: &NginxError) -> Option<&'static str> {
    match err {
        NginxError::Request { .. } | NginxError::InvalidUrl { .. } => Some(NETWORK_HINT),
        NginxError::UpstreamNotFound(_) => {
            Some("Hint: Check the upstream name and --kind (http or stream).")
        }
        _ => None,
    }
}

fn scaling_hint(err: &ScalingError) -> Option<&'static str> {
    match err {
        ScalingError::GroupNotFound(_) => Some(GROUPS_HINT),
        _ => Some(AWS_HINT),
    }
}

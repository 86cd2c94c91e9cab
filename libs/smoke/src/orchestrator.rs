//! Capacity changes.

use nasg_autoscaling::ScalingApi;
use tracing::{error, info, warn};

use crate::error::SmokeError;
use crate::settings::SmokeSettings;

/// Resolve the full name of the first group whose name contains `fragment`.
pub async fn resolve_group_name(
    scaling: &dyn ScalingApi,
    fragment: &str,
) -> Result<String, SmokeError> {
    let groups = scaling.describe_groups().await?;
    let name = groups
        .find_containing(fragment)
        .map(|g| g.name().to_string())
        .ok_or_else(|| SmokeError::GroupNotResolved(fragment.to_string()))?;

    info!(fragment, group = %name, "Resolved Auto Scaling group");
    Ok(name)
}

/// Set the desired capacity of `group`, honoring cooldowns.
///
/// While another scaling activity blocks the request, sleeps the
/// reconfiguration delay and tries again, up to `scale_attempts` requests
/// (at least one). Returns the number of requests made.
pub async fn scale_group(
    scaling: &dyn ScalingApi,
    group: &str,
    capacity: u32,
    settings: &SmokeSettings,
) -> Result<u32, SmokeError> {
    let attempts = settings.scale_attempts.max(1);
    let mut last = None;

    for attempt in 1..=attempts {
        match scaling.set_desired_capacity(group, capacity, true).await {
            Ok(()) => {
                info!(group, capacity, attempt, "Scaling activity started");
                return Ok(attempt);
            }
            Err(e) if e.is_activity_in_progress() => {
                warn!(
                    group,
                    attempt,
                    max_attempts = attempts,
                    delay_secs = settings.reconfiguration_delay.as_secs(),
                    "Scaling activity is in progress, waiting before retry"
                );
                last = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(settings.reconfiguration_delay).await;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    error!(group, attempts, "Failed to scale the group");
    Err(SmokeError::ScaleAttemptsExhausted {
        group: group.to_string(),
        attempts,
        last,
    })
}

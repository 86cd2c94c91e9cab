//! Timing and budget settings.

use std::time::Duration;

use nasg_reconcile::PollBudget;

/// Region used when `--aws-region` is not given.
pub const DEFAULT_AWS_REGION: &str = nasg_autoscaling::DEFAULT_REGION;

/// Time to let the cluster pick up a reconfiguration before checking again.
pub const RECONFIGURATION_DELAY: Duration = Duration::from_secs(60);

/// NGINX Plus API version segment.
pub const NGINX_API_VERSION: u32 = nasg_nginx::DEFAULT_API_VERSION;

/// SetDesiredCapacity attempts while a scaling activity is in progress.
pub const SCALE_ATTEMPTS: u32 = 10;

/// Extra upstream reads after the first one.
pub const PEER_POLL_ATTEMPTS: u32 = 10;

/// Seconds between DescribeAutoScalingGroups calls in the cloud waiter.
pub const CLOUD_WAITER_DELAY_SECS: u64 = 5;

/// DescribeAutoScalingGroups calls before the cloud waiter gives up.
pub const CLOUD_WAITER_MAX_ATTEMPTS: u32 = 20;

/// Capacity for the scale-up pass.
pub const SCALE_UP_CAPACITY: u32 = 5;

/// Capacity for the scale-down pass.
pub const SCALE_DOWN_CAPACITY: u32 = 1;

/// Budgets and delays for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeSettings {
    /// Sleep between scale retries and between upstream reads.
    pub reconfiguration_delay: Duration,

    pub scale_attempts: u32,

    pub peer_poll_attempts: u32,

    pub cloud_waiter_delay_secs: u64,

    pub cloud_waiter_max_attempts: u32,

    pub nginx_api_version: u32,

    /// Timeout for each NGINX Plus request.
    pub http_timeout: Duration,
}

impl Default for SmokeSettings {
    fn default() -> Self {
        Self {
            reconfiguration_delay: RECONFIGURATION_DELAY,
            scale_attempts: SCALE_ATTEMPTS,
            peer_poll_attempts: PEER_POLL_ATTEMPTS,
            cloud_waiter_delay_secs: CLOUD_WAITER_DELAY_SECS,
            cloud_waiter_max_attempts: CLOUD_WAITER_MAX_ATTEMPTS,
            nginx_api_version: NGINX_API_VERSION,
            http_timeout: nasg_nginx::DEFAULT_TIMEOUT,
        }
    }
}

impl SmokeSettings {
    /// Defaults, overridden by `NASG_*` environment variables when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Zero is never a usable delay or budget.
        let num = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        Self {
            reconfiguration_delay: num("NASG_RECONFIGURATION_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconfiguration_delay),
            scale_attempts: num("NASG_SCALE_ATTEMPTS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.scale_attempts),
            peer_poll_attempts: num("NASG_PEER_POLL_ATTEMPTS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.peer_poll_attempts),
            cloud_waiter_delay_secs: num("NASG_CLOUD_WAITER_DELAY_SECS")
                .unwrap_or(defaults.cloud_waiter_delay_secs),
            cloud_waiter_max_attempts: num("NASG_CLOUD_WAITER_MAX_ATTEMPTS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.cloud_waiter_max_attempts),
            nginx_api_version: num("NASG_NGINX_API_VERSION")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.nginx_api_version),
            http_timeout: num("NASG_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }

    /// Budget for the load-balancer wait.
    pub fn peer_budget(&self) -> PollBudget {
        PollBudget::new(self.peer_poll_attempts, self.reconfiguration_delay)
    }

    /// Worst-case wall time of one scenario, ignoring request latency.
    pub fn max_scenario_wait(&self) -> Duration {
        let scale = self.reconfiguration_delay * self.scale_attempts.saturating_sub(1);
        let cloud = Duration::from_secs(self.cloud_waiter_delay_secs)
            * self.cloud_waiter_max_attempts.saturating_sub(1);
        scale + cloud + self.peer_budget().max_wait()
    }
}

//! Scaling control plane interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DescribeGroupsOutput, ScalingGroup};

/// Error code returned while another scaling activity is running.
pub const SCALING_ACTIVITY_IN_PROGRESS: &str = "ScalingActivityInProgress";

/// Scaling control plane errors.
#[derive(Debug, Error)]
pub enum ScalingError {
    #[error("Scaling activity is in progress for group {group}: {message}")]
    ActivityInProgress { group: String, message: String },

    #[error("Auto Scaling group {0} not found")]
    GroupNotFound(String),

    #[error("Auto Scaling API error ({}): {message}", .code.as_deref().unwrap_or("Unknown"))]
    Api {
        code: Option<String>,
        message: String,
    },
}

impl ScalingError {
    /// Service error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ActivityInProgress { .. } => Some(SCALING_ACTIVITY_IN_PROGRESS),
            Self::GroupNotFound(_) => None,
            Self::Api { code, .. } => code.as_deref(),
        }
    }

    /// Returns true if another scaling activity blocks this request.
    pub fn is_activity_in_progress(&self) -> bool {
        matches!(self, Self::ActivityInProgress { .. })
    }
}

/// Operations against the scaling control plane.
#[async_trait]
pub trait ScalingApi: Send + Sync {
    /// Describe every group visible to the caller.
    async fn describe_groups(&self) -> Result<DescribeGroupsOutput, ScalingError>;

    /// Request a new desired capacity.
    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: u32,
        honor_cooldown: bool,
    ) -> Result<(), ScalingError>;

    /// Describe one group by exact name.
    async fn describe_group(&self, name: &str) -> Result<ScalingGroup, ScalingError> {
        self.describe_groups()
            .await?
            .find_exact(name)
            .cloned()
            .ok_or_else(|| ScalingError::GroupNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let busy = ScalingError::ActivityInProgress {
            group: "g".into(),
            message: "busy".into(),
        };
        assert!(busy.is_activity_in_progress());
        assert_eq!(busy.code(), Some(SCALING_ACTIVITY_IN_PROGRESS));

        let denied = ScalingError::Api {
            code: Some("AccessDenied".into()),
            message: "no".into(),
        };
        assert!(!denied.is_activity_in_progress());
        assert_eq!(denied.to_string(), "Auto Scaling API error (AccessDenied): no");
    }
}

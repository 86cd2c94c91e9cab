//! Scaling group model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a group member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    InService,
    Terminating,
    Terminated,
    Detaching,
    Detached,
    EnteringStandby,
    Standby,
    /// Any state not listed above (hook wait states, warm pools, ...).
    Other(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InService => "InService",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Detaching => "Detaching",
            Self::Detached => "Detached",
            Self::EnteringStandby => "EnteringStandby",
            Self::Standby => "Standby",
            Self::Other(s) => s,
        }
    }

    pub fn is_in_service(&self) -> bool {
        matches!(self, Self::InService)
    }
}

impl From<&str> for LifecycleState {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "InService" => Self::InService,
            "Terminating" => Self::Terminating,
            "Terminated" => Self::Terminated,
            "Detaching" => Self::Detaching,
            "Detached" => Self::Detached,
            "EnteringStandby" => Self::EnteringStandby,
            "Standby" => Self::Standby,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LifecycleState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub instance_id: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default)]
    pub health_status: String,
}

impl Instance {
    pub fn new(instance_id: impl Into<String>, lifecycle_state: LifecycleState) -> Self {
        Self {
            instance_id: instance_id.into(),
            lifecycle_state,
            health_status: "Healthy".to_string(),
        }
    }
}

/// An Auto Scaling group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalingGroup {
    pub auto_scaling_group_name: String,
    pub desired_capacity: u32,
    #[serde(default)]
    pub min_size: u32,
    #[serde(default)]
    pub max_size: u32,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl ScalingGroup {
    pub fn name(&self) -> &str {
        &self.auto_scaling_group_name
    }

    /// Number of members in the `InService` state.
    pub fn in_service_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.lifecycle_state.is_in_service())
            .count()
    }

    /// Member counts per lifecycle state.
    pub fn state_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for instance in &self.instances {
            *counts
                .entry(instance.lifecycle_state.as_str().to_string())
                .or_insert(0) += 1;
        }
        counts
    }
}

/// Response of DescribeAutoScalingGroups, all pages merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeGroupsOutput {
    pub auto_scaling_groups: Vec<ScalingGroup>,
}

impl DescribeGroupsOutput {
    /// First group whose name contains `fragment`.
    pub fn find_containing(&self, fragment: &str) -> Option<&ScalingGroup> {
        self.auto_scaling_groups
            .iter()
            .find(|g| g.auto_scaling_group_name.contains(fragment))
    }

    /// Group with exactly this name.
    pub fn find_exact(&self, name: &str) -> Option<&ScalingGroup> {
        self.auto_scaling_groups
            .iter()
            .find(|g| g.auto_scaling_group_name == name)
    }

    /// The response as a JSON document, for waiter expressions.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

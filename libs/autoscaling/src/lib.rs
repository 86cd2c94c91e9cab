//! Auto Scaling control plane access.
//!
//! - [`types`]: the group/instance model, serialized with the same field
//!   names the Auto Scaling API uses so waiter expressions apply unchanged
//! - [`ScalingApi`]: the operations the convergence checks need
//! - [`AwsScalingClient`]: the AWS SDK implementation

mod api;
mod aws;
pub mod types;

pub use api::{ScalingApi, ScalingError, SCALING_ACTIVITY_IN_PROGRESS};
pub use aws::{AwsScalingClient, DEFAULT_PROFILE, DEFAULT_REGION};
pub use types::{DescribeGroupsOutput, Instance, LifecycleState, ScalingGroup};

//! AWS SDK implementation of [`ScalingApi`].

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_autoscaling::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_autoscaling::operation::set_desired_capacity::SetDesiredCapacityError;
use aws_sdk_autoscaling::types as sdk;
use tracing::{debug, info};

use crate::api::{ScalingApi, ScalingError};
use crate::types::{DescribeGroupsOutput, Instance, LifecycleState, ScalingGroup};

/// Region used when none is given.
pub const DEFAULT_REGION: &str = "us-east-2";

/// Shared-config profile used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// Per-operation timeout for Auto Scaling calls.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Auto Scaling client backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsScalingClient {
    client: aws_sdk_autoscaling::Client,
    region: String,
}

impl AwsScalingClient {
    /// Build a client from the shared credential chain.
    ///
    /// Credentials come from the named profile in the shared config and
    /// credentials files, falling back to the rest of the default chain.
    pub async fn connect(region: &str, profile: &str) -> Self {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .profile_name(profile)
            .timeout_config(timeouts)
            .load()
            .await;

        info!(region, profile, "Auto Scaling client configured");

        Self {
            client: aws_sdk_autoscaling::Client::new(&config),
            region: region.to_string(),
        }
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: aws_sdk_autoscaling::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl ScalingApi for AwsScalingClient {
    async fn describe_groups(&self) -> Result<DescribeGroupsOutput, ScalingError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .client
                .describe_auto_scaling_groups()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            groups.extend(page.auto_scaling_groups().iter().map(convert_group));

            match page.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(groups = groups.len(), "Described Auto Scaling groups");
        Ok(DescribeGroupsOutput {
            auto_scaling_groups: groups,
        })
    }

    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: u32,
        honor_cooldown: bool,
    ) -> Result<(), ScalingError> {
        let desired = i32::try_from(capacity).map_err(|_| ScalingError::Api {
            code: Some("ValidationError".to_string()),
            message: format!("desired capacity {capacity} is out of range"),
        })?;

        self.client
            .set_desired_capacity()
            .auto_scaling_group_name(group)
            .desired_capacity(desired)
            .honor_cooldown(honor_cooldown)
            .send()
            .await
            .map_err(|err| set_capacity_error(group, err))?;

        Ok(())
    }
}

fn set_capacity_error<R>(group: &str, err: SdkError<SetDesiredCapacityError, R>) -> ScalingError
where
    R: std::fmt::Debug,
{
    let in_progress = err
        .as_service_error()
        .is_some_and(|e| e.is_scaling_activity_in_progress_fault());
    if in_progress {
        ScalingError::ActivityInProgress {
            group: group.to_string(),
            message: err.message().unwrap_or_default().to_string(),
        }
    } else {
        sdk_error(err)
    }
}

fn sdk_error<E, R>(err: SdkError<E, R>) -> ScalingError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    ScalingError::Api { code, message }
}

// Required members are plain values in some SDK releases and options in
// others; normalize both to `Option`.
fn opt<T>(value: impl Into<Option<T>>) -> Option<T> {
    value.into()
}

fn convert_group(group: &sdk::AutoScalingGroup) -> ScalingGroup {
    let size = |v: Option<i32>| v.map(|n| n.max(0) as u32).unwrap_or(0);

    ScalingGroup {
        auto_scaling_group_name: opt::<&str>(group.auto_scaling_group_name())
            .unwrap_or_default()
            .to_string(),
        desired_capacity: size(opt::<i32>(group.desired_capacity())),
        min_size: size(opt::<i32>(group.min_size())),
        max_size: size(opt::<i32>(group.max_size())),
        instances: group.instances().iter().map(convert_instance).collect(),
    }
}

fn convert_instance(instance: &sdk::Instance) -> Instance {
    Instance {
        instance_id: opt::<&str>(instance.instance_id())
            .unwrap_or_default()
            .to_string(),
        lifecycle_state: opt::<&sdk::LifecycleState>(instance.lifecycle_state())
            .map(|s| LifecycleState::from(s.as_str()))
            .unwrap_or_else(|| LifecycleState::Other(String::new())),
        health_status: opt::<&str>(instance.health_status())
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_autoscaling::error::{BuildError, ErrorMetadata};
    use aws_sdk_autoscaling::types::error::ScalingActivityInProgressFault;

    use super::*;

    // Builders of shapes with required members return `Result` in newer
    // SDK releases and the shape itself in older ones.
    trait Built<T> {
        fn built(self) -> T;
    }

    impl Built<sdk::Instance> for sdk::Instance {
        fn built(self) -> sdk::Instance {
            self
        }
    }

    impl Built<sdk::Instance> for Result<sdk::Instance, BuildError> {
        fn built(self) -> sdk::Instance {
            self.expect("valid instance")
        }
    }

    impl Built<sdk::AutoScalingGroup> for sdk::AutoScalingGroup {
        fn built(self) -> sdk::AutoScalingGroup {
            self
        }
    }

    impl Built<sdk::AutoScalingGroup> for Result<sdk::AutoScalingGroup, BuildError> {
        fn built(self) -> sdk::AutoScalingGroup {
            self.expect("valid group")
        }
    }

    fn sdk_instance(id: &str, state: sdk::LifecycleState) -> sdk::Instance {
        sdk::Instance::builder()
            .instance_id(id)
            .availability_zone("us-east-2a")
            .lifecycle_state(state)
            .health_status("Healthy")
            .protected_from_scale_in(false)
            .build()
            .built()
    }

    #[test]
    fn test_convert_group() {
        let group: sdk::AutoScalingGroup = sdk::AutoScalingGroup::builder()
            .auto_scaling_group_name("stack-WebserverGroup1-XYZ")
            .desired_capacity(3)
            .min_size(1)
            .max_size(10)
            .default_cooldown(300)
            .availability_zones("us-east-2a")
            .health_check_type("EC2")
            .created_time(aws_sdk_autoscaling::primitives::DateTime::from_secs(0))
            .instances(sdk_instance("i-1", sdk::LifecycleState::InService))
            .instances(sdk_instance("i-2", sdk::LifecycleState::InService))
            .instances(sdk_instance("i-3", sdk::LifecycleState::Pending))
            .build()
            .built();

        let converted = convert_group(&group);

        assert_eq!(converted.name(), "stack-WebserverGroup1-XYZ");
        assert_eq!(converted.desired_capacity, 3);
        assert_eq!(converted.min_size, 1);
        assert_eq!(converted.max_size, 10);
        assert_eq!(converted.in_service_count(), 2);
        assert_eq!(converted.instances[2].instance_id, "i-3");
        assert_eq!(converted.instances[2].lifecycle_state, LifecycleState::Pending);
        assert_eq!(converted.instances[0].health_status, "Healthy");
    }

    #[test]
    fn test_convert_unknown_lifecycle_state() {
        let instance = sdk_instance("i-9", sdk::LifecycleState::from("Warmed:Pending"));

        let converted = convert_instance(&instance);
        assert_eq!(
            converted.lifecycle_state,
            LifecycleState::Other("Warmed:Pending".to_string())
        );
    }

    #[test]
    fn test_activity_in_progress_fault() {
        let fault = ScalingActivityInProgressFault::builder()
            .message("Scaling activity is in progress")
            .build();
        let err = SdkError::service_error(
            SetDesiredCapacityError::ScalingActivityInProgressFault(fault),
            (),
        );

        let mapped = set_capacity_error("stack-WebserverGroup1-XYZ", err);
        assert!(mapped.is_activity_in_progress());
        assert!(matches!(
            mapped,
            ScalingError::ActivityInProgress { ref group, .. } if group == "stack-WebserverGroup1-XYZ"
        ));
    }

    #[test]
    fn test_other_faults_keep_code() {
        let meta = ErrorMetadata::builder()
            .code("AccessDenied")
            .message("not authorized")
            .build();
        let err = SdkError::service_error(SetDesiredCapacityError::generic(meta), ());

        let mapped = set_capacity_error("G", err);
        assert!(!mapped.is_activity_in_progress());
        assert_eq!(mapped.code(), Some("AccessDenied"));
        assert_eq!(mapped.to_string(), "Auto Scaling API error (AccessDenied): not authorized");
    }
}

//! Cloud-side convergence: wait for members to come into service.

use nasg_autoscaling::ScalingApi;
use nasg_reconcile::{Acceptor, AcceptorState, OperationFailure, WaiterConfig, WaiterModel};
use serde_json::Value;
use tracing::info;

use crate::error::SmokeError;
use crate::settings::SmokeSettings;

/// Name of the waiter in [`autoscaling_completed_config`].
pub const AUTOSCALING_COMPLETED: &str = "autoscaling_completed";

/// Operation the waiter polls.
pub const DESCRIBE_GROUPS_OPERATION: &str = "DescribeAutoScalingGroups";

/// Expression yielding, per group whose name starts with `group`, whether
/// it has exactly `capacity` members `InService`.
///
/// The list is empty when no group matches.
pub fn in_service_expression(group: &str, capacity: u32) -> String {
    format!(
        "AutoScalingGroups[?starts_with(AutoScalingGroupName, {})].\
         [length(Instances[?LifecycleState=='InService']) == `{capacity}`][]",
        json_literal(group)
    )
}

/// A JMESPath literal holding `value` as a JSON string.
fn json_literal(value: &str) -> String {
    let quoted = Value::String(value.to_string()).to_string();
    format!("`{}`", quoted.replace('`', "\\`"))
}

/// Waiter definition for the in-service check.
pub fn autoscaling_completed_config(
    group: &str,
    capacity: u32,
    settings: &SmokeSettings,
) -> WaiterConfig {
    let argument = in_service_expression(group, capacity);
    let model = WaiterModel {
        operation: DESCRIBE_GROUPS_OPERATION.to_string(),
        delay: settings.cloud_waiter_delay_secs,
        max_attempts: settings.cloud_waiter_max_attempts,
        acceptors: vec![
            Acceptor::path_all(argument.clone(), Value::Bool(true), AcceptorState::Success),
            Acceptor::path_any(argument, Value::Bool(false), AcceptorState::Retry),
        ],
    };
    WaiterConfig::single(AUTOSCALING_COMPLETED, model)
}

/// Block until `capacity` members of `group` are `InService`.
///
/// Returns the number of describe calls made.
pub async fn wait_for_in_service(
    scaling: &dyn ScalingApi,
    group: &str,
    capacity: u32,
    settings: &SmokeSettings,
) -> Result<u32, SmokeError> {
    let config = autoscaling_completed_config(group, capacity, settings);
    let model = config.waiter(AUTOSCALING_COMPLETED)?;

    info!(
        group,
        capacity,
        delay_secs = model.delay,
        max_attempts = model.max_attempts,
        "Waiting for instances to come into service"
    );

    let attempts = model
        .wait(AUTOSCALING_COMPLETED, || async move {
            scaling
                .describe_groups()
                .await
                .map(|groups| groups.to_document())
                .map_err(|e| OperationFailure::new(e.code().map(str::to_string), e.to_string()))
        })
        .await?;

    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use nasg_reconcile::waiter::search;
    use nasg_reconcile::Matcher;
    use serde_json::json;

    use super::*;

    fn describe_doc() -> Value {
        json!({
            "AutoScalingGroups": [{
                "AutoScalingGroupName": "stack-WebserverGroup1-XYZ",
                "Instances": [
                    {"InstanceId": "i-1", "LifecycleState": "InService"},
                    {"InstanceId": "i-2", "LifecycleState": "InService"},
                    {"InstanceId": "i-3", "LifecycleState": "Terminating"}
                ]
            }]
        })
    }

    #[test]
    fn test_expression_matches_in_service_count() {
        let doc = describe_doc();

        let hit = in_service_expression("stack-WebserverGroup1-XYZ", 2);
        let miss = in_service_expression("stack-WebserverGroup1-XYZ", 3);
        let none = in_service_expression("stack-WebserverGroup2", 2);
        assert_eq!(search(&hit, &doc).unwrap(), json!([true]));
        assert_eq!(search(&miss, &doc).unwrap(), json!([false]));
        assert_eq!(search(&none, &doc).unwrap(), json!([]));
    }

    #[test]
    fn test_acceptors_succeed_only_when_in_service() {
        let settings = SmokeSettings::default();
        let doc = Ok(describe_doc());
        let state = |capacity| {
            let config =
                autoscaling_completed_config("stack-WebserverGroup1-XYZ", capacity, &settings);
            config
                .waiter(AUTOSCALING_COMPLETED)
                .unwrap()
                .evaluate(&doc)
                .unwrap()
        };

        assert_eq!(state(2), Some(AcceptorState::Success));
        assert_eq!(state(3), Some(AcceptorState::Retry));

        let other = autoscaling_completed_config("stack-WebserverGroup2", 2, &settings);
        let no_match = other.waiter(AUTOSCALING_COMPLETED).unwrap().evaluate(&doc).unwrap();
        assert_eq!(no_match, None);
    }

    #[test]
    fn test_expression_quotes_group_names() {
        let expr = in_service_expression("we`ird\"name", 1);
        assert!(expr.contains(r#"`"we\`ird\"name"`"#));
    }

    #[test]
    fn test_config_uses_settings() {
        let settings = SmokeSettings::default();
        let config = autoscaling_completed_config("G", 5, &settings);
        config.validate().unwrap();

        let model = config.waiter(AUTOSCALING_COMPLETED).unwrap();
        assert_eq!(model.operation, "DescribeAutoScalingGroups");
        assert_eq!(model.delay, 5);
        assert_eq!(model.max_attempts, 20);
        assert_eq!(model.acceptors[0].matcher, Matcher::PathAll);
        assert_eq!(model.acceptors[0].state, AcceptorState::Success);
        assert_eq!(model.acceptors[1].matcher, Matcher::PathAny);
        assert_eq!(model.acceptors[1].state, AcceptorState::Retry);
    }
}

//! In-memory Auto Scaling control plane.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use nasg_autoscaling::{
    DescribeGroupsOutput, Instance, LifecycleState, ScalingApi, ScalingError, ScalingGroup,
};

/// A recorded SetDesiredCapacity request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCapacityCall {
    pub group: String,
    pub capacity: u32,
    pub honor_cooldown: bool,
}

#[derive(Debug)]
struct FakeGroup {
    name: String,
    desired: u32,
    in_service: u32,
    /// Describe calls left before `in_service` catches up with `desired`.
    lag_remaining: u32,
}

impl FakeGroup {
    fn snapshot(&self) -> ScalingGroup {
        let mut instances: Vec<Instance> = (0..self.in_service)
            .map(|i| Instance::new(format!("i-{i:08x}"), LifecycleState::InService))
            .collect();

        // Missing members show as Pending. Surplus ones stay InService until
        // the activity settles.
        if self.desired > self.in_service {
            instances.extend(
                (0..self.desired - self.in_service)
                    .map(|i| Instance::new(format!("i-new{i:05x}"), LifecycleState::Pending)),
            );
        }

        ScalingGroup {
            auto_scaling_group_name: self.name.clone(),
            desired_capacity: self.desired,
            min_size: 0,
            max_size: 10,
            instances,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    groups: Vec<FakeGroup>,
    conflicts_remaining: u32,
    convergence_lag: u32,
    describe_calls: u32,
    set_calls: Vec<SetCapacityCall>,
}

/// In-memory [`ScalingApi`].
///
/// After a capacity change, a group reports its old membership for
/// `convergence_lag` describe calls, then switches to the new capacity with
/// every member `InService`. A lagging scale-up shows the missing members as
/// `Pending`; a lagging scale-down still has every old member `InService`.
#[derive(Debug, Default)]
pub struct FakeScalingApi {
    state: Mutex<FakeState>,
}

/// Lag value meaning "never converge".
const NEVER: u32 = u32::MAX;

impl FakeScalingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settled group.
    pub fn with_group(self, name: &str, capacity: u32) -> Self {
        self.lock().groups.push(FakeGroup {
            name: name.to_string(),
            desired: capacity,
            in_service: capacity,
            lag_remaining: 0,
        });
        self
    }

    /// Reject the next `n` capacity changes with a scaling-in-progress fault.
    pub fn with_conflicts(self, n: u32) -> Self {
        self.lock().conflicts_remaining = n;
        self
    }

    /// Converge only after this many describe calls.
    pub fn with_convergence_lag(self, describes: u32) -> Self {
        self.lock().convergence_lag = describes;
        self
    }

    /// Never bring instances in service after a capacity change.
    pub fn never_converge(self) -> Self {
        self.with_convergence_lag(NEVER)
    }

    /// Recorded SetDesiredCapacity requests that were accepted or rejected.
    pub fn set_calls(&self) -> Vec<SetCapacityCall> {
        self.lock().set_calls.clone()
    }

    pub fn describe_calls(&self) -> u32 {
        self.lock().describe_calls
    }

    /// Current `InService` count of a group, without advancing time.
    pub fn in_service(&self, name: &str) -> Option<u32> {
        self.lock()
            .groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.in_service)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ScalingApi for FakeScalingApi {
    async fn describe_groups(&self) -> Result<DescribeGroupsOutput, ScalingError> {
        let mut state = self.lock();
        state.describe_calls += 1;

        for group in &mut state.groups {
            if group.in_service == group.desired || group.lag_remaining == NEVER {
                continue;
            }
            if group.lag_remaining == 0 {
                group.in_service = group.desired;
            } else {
                group.lag_remaining -= 1;
            }
        }

        Ok(DescribeGroupsOutput {
            auto_scaling_groups: state.groups.iter().map(FakeGroup::snapshot).collect(),
        })
    }

    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: u32,
        honor_cooldown: bool,
    ) -> Result<(), ScalingError> {
        let mut state = self.lock();
        state.set_calls.push(SetCapacityCall {
            group: group.to_string(),
            capacity,
            honor_cooldown,
        });

        if state.conflicts_remaining > 0 {
            state.conflicts_remaining -= 1;
            return Err(ScalingError::ActivityInProgress {
                group: group.to_string(),
                message: "Scaling activity is in progress and blocks this action".to_string(),
            });
        }

        let lag = state.convergence_lag;
        let target = state
            .groups
            .iter_mut()
            .find(|g| g.name == group)
            .ok_or_else(|| ScalingError::Api {
                code: Some("ValidationError".to_string()),
                message: format!("AutoScalingGroup name not found - {group}"),
            })?;

        target.desired = capacity;
        target.lag_remaining = lag;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_converges_after_lag() {
        let fake = FakeScalingApi::new()
            .with_group("stack-WebserverGroup1-X", 1)
            .with_convergence_lag(2);

        fake.set_desired_capacity("stack-WebserverGroup1-X", 3, true)
            .await
            .unwrap();

        let first = fake.describe_group("stack-WebserverGroup1-X").await.unwrap();
        assert_eq!(first.desired_capacity, 3);
        assert_eq!(first.in_service_count(), 1);
        assert_eq!(first.state_counts()["Pending"], 2);

        // describe_group counts as a describe call too.
        fake.describe_groups().await.unwrap();
        let settled = fake.describe_group("stack-WebserverGroup1-X").await.unwrap();
        assert_eq!(settled.in_service_count(), 3);
        assert_eq!(fake.describe_calls(), 3);
    }

    #[tokio::test]
    async fn test_scale_down_keeps_members_until_settled() {
        let fake = FakeScalingApi::new()
            .with_group("G", 5)
            .with_convergence_lag(1);

        fake.set_desired_capacity("G", 1, true).await.unwrap();
        let lagging = fake.describe_group("G").await.unwrap();
        assert_eq!(lagging.desired_capacity, 1);
        assert_eq!(lagging.in_service_count(), 5);
        assert_eq!(fake.in_service("G"), Some(5));

        let settled = fake.describe_group("G").await.unwrap();
        assert_eq!(settled.instances.len(), 1);
        assert_eq!(settled.in_service_count(), 1);
    }

    #[tokio::test]
    async fn test_conflicts_then_success() {
        let fake = FakeScalingApi::new().with_group("G", 1).with_conflicts(2);

        for _ in 0..2 {
            let err = fake.set_desired_capacity("G", 2, true).await.unwrap_err();
            assert!(err.is_activity_in_progress());
        }
        fake.set_desired_capacity("G", 2, true).await.unwrap();

        assert_eq!(fake.set_calls().len(), 3);
        assert!(fake.set_calls().iter().all(|c| c.honor_cooldown));
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let fake = FakeScalingApi::new();
        let err = fake.set_desired_capacity("missing", 1, true).await.unwrap_err();
        assert_eq!(err.code(), Some("ValidationError"));
    }

    #[tokio::test]
    async fn test_never_converges() {
        let fake = FakeScalingApi::new().with_group("G", 1).never_converge();
        fake.set_desired_capacity("G", 4, true).await.unwrap();

        for _ in 0..50 {
            fake.describe_groups().await.unwrap();
        }
        assert_eq!(fake.in_service("G"), Some(1));
    }
}

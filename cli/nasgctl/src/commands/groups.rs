//! Groups command (list Auto Scaling groups).

use anyhow::Result;
use clap::Args;
use nasg_autoscaling::ScalingGroup;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// Groups command - list groups with capacity and instance states.
#[derive(Debug, Args)]
pub struct GroupsCommand {
    /// Only show groups whose name contains this fragment.
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, Tabled)]
pub struct GroupRow {
    #[tabled(rename = "Group")]
    name: String,
    #[tabled(rename = "Desired")]
    desired: u32,
    #[tabled(rename = "Min")]
    min: u32,
    #[tabled(rename = "Max")]
    max: u32,
    #[tabled(rename = "InService")]
    in_service: usize,
    #[tabled(rename = "States")]
    states: String,
}

impl From<&ScalingGroup> for GroupRow {
    fn from(g: &ScalingGroup) -> Self {
        let states = g
            .state_counts()
            .iter()
            .map(|(state, count)| format!("{state}={count}"))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            name: g.name().to_string(),
            desired: g.desired_capacity,
            min: g.min_size,
            max: g.max_size,
            in_service: g.in_service_count(),
            states,
        }
    }
}

impl GroupsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let scaling = ctx.scaling().await;
        let output = scaling.describe_groups().await?;

        let groups: Vec<&ScalingGroup> = output
            .auto_scaling_groups
            .iter()
            .filter(|g| {
                self.filter
                    .as_deref()
                    .map_or(true, |fragment| g.name().contains(fragment))
            })
            .collect();

        let rows: Vec<GroupRow> = groups.iter().copied().map(GroupRow::from).collect();
        print_output(&groups, &rows, ctx.format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nasg_autoscaling::{Instance, LifecycleState};

    use super::*;

    #[test]
    fn test_group_row() {
        let group = ScalingGroup {
            auto_scaling_group_name: "stack-WebserverGroup1-X".into(),
            desired_capacity: 3,
            min_size: 1,
            max_size: 10,
            instances: vec![
                Instance::new("i-1", LifecycleState::InService),
                Instance::new("i-2", LifecycleState::InService),
                Instance::new("i-3", LifecycleState::Pending),
            ],
        };

        let row = GroupRow::from(&group);
        assert_eq!(row.desired, 3);
        assert_eq!(row.in_service, 2);
        assert_eq!(row.states, "InService=2 Pending=1");
    }
}

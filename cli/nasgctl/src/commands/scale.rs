//! Scale command (set the desired capacity of one group).

use anyhow::Result;
use clap::Args;
use nasg_smoke::cloud::wait_for_in_service;
use nasg_smoke::orchestrator::{resolve_group_name, scale_group};
use serde::Serialize;

use crate::output::{print_json, print_output, print_success, OutputFormat};

use super::groups::GroupRow;
use super::CommandContext;

/// Scale command - set the desired capacity and wait for instances.
#[derive(Debug, Args)]
pub struct ScaleCommand {
    /// Full group name or a fragment of it (e.g. WebserverGroup1).
    #[arg(long)]
    group: String,

    /// New desired capacity.
    #[arg(long)]
    capacity: u32,

    /// Return once the request is accepted, without waiting for instances.
    #[arg(long)]
    no_wait: bool,
}

#[derive(Debug, Serialize)]
struct ScaleResult {
    group: String,
    capacity: u32,
    scale_attempts: u32,
    cloud_attempts: Option<u32>,
    desired_capacity: u32,
    in_service: usize,
}

impl ScaleCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let scaling = ctx.scaling().await;
        let scaling = scaling.as_ref();

        let group = resolve_group_name(scaling, &self.group).await?;
        let scale_attempts = scale_group(scaling, &group, self.capacity, &ctx.settings).await?;

        let cloud_attempts = if self.no_wait {
            None
        } else {
            Some(wait_for_in_service(scaling, &group, self.capacity, &ctx.settings).await?)
        };

        let state = scaling.describe_group(&group).await?;

        match ctx.format {
            OutputFormat::Json => print_json(&ScaleResult {
                group: group.clone(),
                capacity: self.capacity,
                scale_attempts,
                cloud_attempts,
                desired_capacity: state.desired_capacity,
                in_service: state.in_service_count(),
            }),
            OutputFormat::Table => {
                let message = if cloud_attempts.is_some() {
                    format!(
                        "Group {} has {} instances in service",
                        group, self.capacity
                    )
                } else {
                    format!(
                        "Requested capacity {} for group {}",
                        self.capacity, group
                    )
                };
                print_success(&message);
                print_output(&state, &[GroupRow::from(&state)], ctx.format);
            }
        }

        Ok(())
    }
}

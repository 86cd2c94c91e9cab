//! Check command (preflight).

use anyhow::Result;
use clap::Args;
use nasg_smoke::PreflightRow;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{cell, print_output, print_success, OutputFormat};

use super::{CommandContext, ScenarioArgs};

/// Check command - verify every scenario can run without scaling anything.
#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    scenarios: ScenarioArgs,
}

#[derive(Debug, Tabled)]
struct CheckRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Desired")]
    desired: String,
    #[tabled(rename = "InService")]
    in_service: String,
    #[tabled(rename = "Upstream")]
    upstream: String,
    #[tabled(rename = "Peers")]
    peers: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&PreflightRow> for CheckRow {
    fn from(r: &PreflightRow) -> Self {
        Self {
            scenario: r.scenario.clone(),
            group: cell(r.group.as_deref()),
            desired: cell(r.desired_capacity),
            in_service: cell(r.in_service),
            upstream: r.upstream.clone(),
            peers: cell(r.peers),
            status: r.error.clone().unwrap_or_else(|| "ok".to_string()),
        }
    }
}

impl CheckCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let scenarios = self.scenarios.load()?;
        let runner = ctx.runner().await?;

        let rows = runner.preflight(&scenarios).await?;
        let table: Vec<CheckRow> = rows.iter().map(CheckRow::from).collect();
        print_output(&rows, &table, ctx.format);

        let failed = rows.iter().filter(|r| !r.is_ok()).count();
        if failed > 0 {
            return Err(CliError::PreflightFailed {
                failed,
                total: rows.len(),
            }
            .into());
        }

        if ctx.format == OutputFormat::Table {
            print_success("All scenarios are ready to run");
        }
        Ok(())
    }
}

//! Run command (scenario matrix).

use anyhow::Result;
use clap::Args;
use nasg_smoke::{Direction, ScenarioReport};
use tabled::Tabled;
use tracing::info;

use crate::error::CliError;
use crate::output::{cell, print_failure, print_info, print_output, print_success, OutputFormat};

use super::{CommandContext, ScenarioArgs};

/// Run command - scale every group up, then down, checking each upstream.
#[derive(Debug, Args)]
pub struct RunCommand {
    #[command(flatten)]
    scenarios: ScenarioArgs,

    /// Capacity for the scale-up pass.
    #[arg(long, default_value_t = Direction::Up.capacity())]
    up: u32,

    /// Capacity for the scale-down pass.
    #[arg(long, default_value_t = Direction::Down.capacity())]
    down: u32,

    /// Skip the scale-down pass.
    #[arg(long)]
    no_down: bool,
}

#[derive(Debug, Tabled)]
struct ReportRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Capacity")]
    capacity: u32,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Upstream")]
    upstream: String,
    #[tabled(rename = "Peers")]
    peers: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Time (s)")]
    elapsed: String,
}

impl From<&ScenarioReport> for ReportRow {
    fn from(r: &ScenarioReport) -> Self {
        Self {
            scenario: r.scenario.clone(),
            capacity: r.capacity,
            group: cell(r.group.as_deref()),
            upstream: r.upstream.clone(),
            peers: cell(r.peers),
            result: match (&r.error, r.passed) {
                (_, true) => "pass".to_string(),
                (Some(e), false) => e.clone(),
                (None, false) => "fail".to_string(),
            },
            elapsed: format!("{:.1}", r.elapsed_secs),
        }
    }
}

impl RunCommand {
    fn capacities(&self) -> Vec<u32> {
        if self.no_down {
            vec![self.up]
        } else {
            vec![self.up, self.down]
        }
    }

    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let scenarios = self.scenarios.load()?;
        let capacities = self.capacities();
        let runner = ctx.runner().await?;

        info!(
            scenarios = scenarios.len(),
            capacities = ?capacities,
            max_scenario_wait_secs = runner.settings().max_scenario_wait().as_secs(),
            "Starting scenario matrix"
        );
        if ctx.format == OutputFormat::Table {
            print_info(&format!(
                "Running {} scenarios at capacities {:?}",
                scenarios.len(),
                capacities
            ));
        }

        let reports = runner.run_matrix(&scenarios, &capacities).await;

        let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from).collect();
        print_output(&reports, &rows, ctx.format);

        let total = reports.len();
        let failed = reports.iter().filter(|r| !r.passed).count();
        if failed > 0 {
            if ctx.format == OutputFormat::Table {
                print_failure(&format!("{failed} of {total} scenarios failed"));
            }
            return Err(CliError::ScenariosFailed { failed, total }.into());
        }

        if ctx.format == OutputFormat::Table {
            print_success(&format!("All {total} scenarios passed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::super::Cli;
    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunCommand,
    }

    #[test]
    fn test_default_capacities() {
        let h = Harness::try_parse_from(["run"]).unwrap();
        assert_eq!(h.run.capacities(), vec![5, 1]);

        let h = Harness::try_parse_from(["run", "--up", "3", "--no-down"]).unwrap();
        assert_eq!(h.run.capacities(), vec![3]);
    }

    #[test]
    fn test_parses_as_subcommand() {
        Cli::try_parse_from(["nasg-smoke", "run", "--only", "backend1,backend2"]).unwrap();
    }

    #[test]
    fn test_row_shows_error() {
        let report = ScenarioReport {
            scenario: "backend1".into(),
            group: None,
            upstream: "/http/upstreams/backend1".into(),
            capacity: 5,
            passed: false,
            peers: Some(2),
            peer_wait: None,
            error: Some("Expected 5 servers, found: []".into()),
            elapsed_secs: 1.04,
        };
        let row = ReportRow::from(&report);
        assert_eq!(row.group, "-");
        assert_eq!(row.peers, "2");
        assert_eq!(row.result, "Expected 5 servers, found: []");
        assert_eq!(row.elapsed, "1.0");
    }
}

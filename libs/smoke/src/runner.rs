//! Scenario runner.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use nasg_autoscaling::ScalingApi;
use nasg_nginx::{NginxClient, UpstreamPeerSet};
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use crate::assertion::assert_peer_count;
use crate::cloud::wait_for_in_service;
use crate::error::SmokeError;
use crate::orchestrator::{resolve_group_name, scale_group};
use crate::peers::{wait_for_peers, PeerWait};
use crate::scenario::Scenario;
use crate::settings::{SmokeSettings, SCALE_DOWN_CAPACITY, SCALE_UP_CAPACITY};

/// Scale direction of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Target capacity for this direction.
    pub fn capacity(&self) -> u32 {
        match self {
            Self::Up => SCALE_UP_CAPACITY,
            Self::Down => SCALE_DOWN_CAPACITY,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Everything observed by a successful scenario.
#[derive(Debug, Clone)]
pub struct ConvergenceReport {
    pub group: String,
    pub capacity: u32,
    pub scale_attempts: u32,
    pub cloud_attempts: u32,
    pub peer_wait: PeerWait,
    pub peers: UpstreamPeerSet,
}

/// Outcome of one scenario at one capacity.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub group: Option<String>,
    pub upstream: String,
    pub capacity: u32,
    pub passed: bool,
    pub peers: Option<usize>,
    pub peer_wait: Option<PeerWait>,
    pub error: Option<String>,
    pub elapsed_secs: f64,
}

/// Result of checking one scenario's wiring without scaling anything.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightRow {
    pub scenario: String,
    pub group: Option<String>,
    pub desired_capacity: Option<u32>,
    pub in_service: Option<usize>,
    pub upstream: String,
    pub peers: Option<usize>,
    pub error: Option<String>,
}

impl PreflightRow {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs scenarios against a scaling control plane and an NGINX Plus API.
pub struct SmokeRunner {
    scaling: Arc<dyn ScalingApi>,
    nginx: NginxClient,
    settings: SmokeSettings,
}

impl SmokeRunner {
    pub fn new(scaling: Arc<dyn ScalingApi>, nginx: NginxClient, settings: SmokeSettings) -> Self {
        Self {
            scaling,
            nginx,
            settings,
        }
    }

    pub fn settings(&self) -> &SmokeSettings {
        &self.settings
    }

    /// Scale the scenario's group to `capacity` and check the upstream follows.
    pub async fn converge(
        &self,
        scenario: &Scenario,
        capacity: u32,
    ) -> Result<ConvergenceReport, SmokeError> {
        let group = resolve_group_name(self.scaling.as_ref(), &scenario.group).await?;
        self.converge_group(scenario, group, capacity).await
    }

    /// The stages after name resolution, for an already resolved `group`.
    async fn converge_group(
        &self,
        scenario: &Scenario,
        group: String,
        capacity: u32,
    ) -> Result<ConvergenceReport, SmokeError> {
        let scaling = self.scaling.as_ref();
        let upstream = scenario.upstream_ref();

        let scale_attempts = scale_group(scaling, &group, capacity, &self.settings).await?;
        let cloud_attempts =
            wait_for_in_service(scaling, &group, capacity, &self.settings).await?;
        let peer_wait = wait_for_peers(&self.nginx, &upstream, capacity, &self.settings).await?;
        let peers = assert_peer_count(&self.nginx, &upstream, capacity).await?;

        Ok(ConvergenceReport {
            group,
            capacity,
            scale_attempts,
            cloud_attempts,
            peer_wait,
            peers,
        })
    }

    /// Like [`converge`](Self::converge), but folds any failure into the report.
    pub async fn run_scenario(&self, scenario: &Scenario, capacity: u32) -> ScenarioReport {
        let span = info_span!("scenario", id = %scenario.id, capacity);
        let started = Instant::now();

        let (group, result) = async {
            match resolve_group_name(self.scaling.as_ref(), &scenario.group).await {
                Ok(group) => (
                    Some(group.clone()),
                    self.converge_group(scenario, group, capacity).await,
                ),
                Err(e) => (None, Err(e)),
            }
        }
        .instrument(span)
        .await;
        let elapsed_secs = started.elapsed().as_secs_f64();
        let upstream = scenario.upstream_ref().to_string();

        match result {
            Ok(report) => {
                info!(scenario = %scenario.id, capacity, elapsed_secs, "Scenario passed");
                ScenarioReport {
                    scenario: scenario.id.clone(),
                    group: Some(report.group),
                    upstream,
                    capacity,
                    passed: true,
                    peers: Some(report.peers.len()),
                    peer_wait: Some(report.peer_wait),
                    error: None,
                    elapsed_secs,
                }
            }
            Err(e) => {
                error!(scenario = %scenario.id, capacity, error = %e, "Scenario failed");
                let peers = match &e {
                    SmokeError::PeerCountMismatch { found, .. } => Some(*found),
                    _ => None,
                };
                ScenarioReport {
                    scenario: scenario.id.clone(),
                    group,
                    upstream,
                    capacity,
                    passed: false,
                    peers,
                    peer_wait: None,
                    error: Some(e.to_string()),
                    elapsed_secs,
                }
            }
        }
    }

    /// Run every scenario at each capacity in turn.
    ///
    /// All scenarios are scaled to the first capacity before any is scaled
    /// to the second.
    pub async fn run_matrix(&self, scenarios: &[Scenario], capacities: &[u32]) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(scenarios.len() * capacities.len());
        for &capacity in capacities {
            for scenario in scenarios {
                reports.push(self.run_scenario(scenario, capacity).await);
            }
        }
        reports
    }

    /// Check the API is reachable, every group resolves and every upstream exists.
    pub async fn preflight(&self, scenarios: &[Scenario]) -> Result<Vec<PreflightRow>, SmokeError> {
        self.nginx.check_api().await?;
        let groups = self.scaling.describe_groups().await?;

        let mut rows = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let upstream = scenario.upstream_ref();
            let group = groups.find_containing(&scenario.group);

            let mut row = PreflightRow {
                scenario: scenario.id.clone(),
                group: group.map(|g| g.name().to_string()),
                desired_capacity: group.map(|g| g.desired_capacity),
                in_service: group.map(|g| g.in_service_count()),
                upstream: upstream.to_string(),
                peers: None,
                error: None,
            };

            if group.is_none() {
                row.error = Some(SmokeError::GroupNotResolved(scenario.group.clone()).to_string());
            }

            match self.nginx.peers(&upstream).await {
                Ok(peers) => row.peers = Some(peers.len()),
                Err(e) => {
                    row.error.get_or_insert_with(|| e.to_string());
                }
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

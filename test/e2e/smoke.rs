//! Live smoke test against a deployed stack.
//!
//! Scales each reference Auto Scaling group up and back down and checks that
//! the matching NGINX Plus upstream follows. Needs AWS credentials, a running
//! sync agent and:
//!
//! - `NGINX_API`: NGINX Plus API url, e.g. `http://lb.example.com:8080/api`
//! - `AWS_REGION` (default `us-east-2`) and `AWS_PROFILE` (default `default`)
//!
//! ## Running
//!
//! ```bash
//! NGINX_API=http://lb:8080/api cargo test -p nasg-e2e --test smoke -- --ignored
//! ```
//!
//! Each case takes up to half an hour with the default delays.

use std::sync::Arc;

use anyhow::{Context, Result};
use nasg_autoscaling::AwsScalingClient;
use nasg_nginx::NginxClient;
use nasg_smoke::{default_scenarios, CliArguments, Direction, SmokeRunner, SmokeSettings};
use rstest::rstest;
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

async fn live_runner() -> Result<SmokeRunner> {
    let args = CliArguments::from_env().context("NGINX_API must point at the NGINX Plus API")?;
    let settings = SmokeSettings::from_env();

    let nginx = NginxClient::new(
        &args.nginx_api,
        settings.nginx_api_version,
        settings.http_timeout,
    )?;
    nginx
        .check_api()
        .await
        .context("NGINX Plus API is not reachable")?;

    let scaling = AwsScalingClient::connect(&args.aws_region, &args.aws_profile).await;
    Ok(SmokeRunner::new(Arc::new(scaling), nginx, settings))
}

#[rstest]
#[case::backend1("backend1")]
#[case::backend2("backend2")]
#[case::tcp_backend("tcp-backend")]
#[tokio::test]
#[ignore] // Requires AWS credentials and a deployed stack
async fn test_upstream_follows_group(#[case] id: &str) -> Result<()> {
    init_tracing();
    let runner = live_runner().await?;
    let scenario = default_scenarios()
        .into_iter()
        .find(|s| s.id == id)
        .context("unknown scenario")?;

    // Up before down; the two passes share the group.
    for direction in [Direction::Up, Direction::Down] {
        let report = runner.converge(&scenario, direction.capacity()).await?;
        info!(
            scenario = %scenario.id,
            %direction,
            group = %report.group,
            peers = report.peers.len(),
            "Pass complete"
        );
        assert_eq!(report.peers.len(), direction.capacity() as usize);
    }

    Ok(())
}

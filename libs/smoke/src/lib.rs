//! Scale an Auto Scaling group and check NGINX Plus follows.
//!
//! Each scenario runs four stages in order:
//!
//! 1. **Scale**: request the new desired capacity, retrying while another
//!    scaling activity is in progress ([`orchestrator`])
//! 2. **Cloud wait**: poll the group until enough members are `InService`
//!    ([`cloud`]); running out of attempts fails the scenario
//! 3. **Load balancer wait**: poll the upstream until the peer count matches
//!    ([`peers`]); running out of rounds is not an error
//! 4. **Assert**: one final read of the upstream ([`assertion`])
//!
//! [`SmokeRunner`] strings the stages together for a list of [`Scenario`]s.

pub mod args;
pub mod assertion;
pub mod cloud;
pub mod error;
pub mod orchestrator;
pub mod peers;
pub mod runner;
pub mod scenario;
pub mod settings;

pub use args::CliArguments;
pub use error::SmokeError;
pub use runner::{ConvergenceReport, Direction, PreflightRow, ScenarioReport, SmokeRunner};
pub use scenario::{default_scenarios, Scenario};
pub use settings::SmokeSettings;

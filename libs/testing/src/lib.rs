//! Test doubles for the convergence checks.
//!
//! - [`FakeScalingApi`]: an in-memory Auto Scaling control plane with
//!   configurable conflicts and convergence lag
//! - [`NginxMock`]: a wiremock server speaking the NGINX Plus upstream API,
//!   either from scripted peer counts or mirroring a [`FakeScalingApi`] group

mod nginx;
mod scaling;

pub use nginx::{peer_document, NginxMock};
pub use scaling::{FakeScalingApi, SetCapacityCall};

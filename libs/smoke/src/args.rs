//! Run-wide arguments.

use tracing::info;

use crate::error::SmokeError;
use crate::settings::DEFAULT_AWS_REGION;

/// Environment variable holding the NGINX Plus API url.
pub const NGINX_API_ENV: &str = "NGINX_API";

/// Environment variable holding the AWS region.
pub const AWS_REGION_ENV: &str = "AWS_REGION";

/// Environment variable holding the shared-config profile.
pub const AWS_PROFILE_ENV: &str = "AWS_PROFILE";

/// Endpoint and region, supplied once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArguments {
    /// NGINX Plus API url, without the version segment.
    pub nginx_api: String,

    pub aws_region: String,

    pub aws_profile: String,
}

impl CliArguments {
    /// Validate and log the arguments.
    pub fn new(
        nginx_api: impl Into<String>,
        aws_region: impl Into<String>,
        aws_profile: impl Into<String>,
    ) -> Result<Self, SmokeError> {
        let nginx_api = nginx_api.into().trim().to_string();
        if nginx_api.is_empty() {
            return Err(SmokeError::InvalidArguments(
                "Empty NGINX Plus API url is not allowed".to_string(),
            ));
        }

        let aws_region = non_empty_or(aws_region.into(), DEFAULT_AWS_REGION);
        let aws_profile = non_empty_or(aws_profile.into(), nasg_autoscaling::DEFAULT_PROFILE);

        info!(nginx_api = %nginx_api, "Tests will use NGINX Plus API url");
        info!(aws_region = %aws_region, aws_profile = %aws_profile, "Tests will use AWS region");

        Ok(Self {
            nginx_api,
            aws_region,
            aws_profile,
        })
    }

    /// Read the arguments from `NGINX_API`, `AWS_REGION` and `AWS_PROFILE`.
    pub fn from_env() -> Result<Self, SmokeError> {
        Self::new(
            std::env::var(NGINX_API_ENV).unwrap_or_default(),
            std::env::var(AWS_REGION_ENV).unwrap_or_default(),
            std::env::var(AWS_PROFILE_ENV).unwrap_or_default(),
        )
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_url() {
        let err = CliArguments::new("  ", "us-east-2", "default").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments: Empty NGINX Plus API url is not allowed"
        );
    }

    #[test]
    fn test_region_and_profile_defaults() {
        let args = CliArguments::new("http://lb:8080/api", "", "").unwrap();
        assert_eq!(args.aws_region, "us-east-2");
        assert_eq!(args.aws_profile, "default");

        let args = CliArguments::new("http://lb:8080/api", "eu-west-1", "ci").unwrap();
        assert_eq!(args.aws_region, "eu-west-1");
        assert_eq!(args.aws_profile, "ci");
    }
}

//! Scenario definitions.
//!
//! A scenario pairs an Auto Scaling group (named by a fragment of its full
//! name) with the NGINX Plus upstream that should track it. Scenarios can
//! be loaded from YAML:
//!
//! ```yaml
//! scenarios:
//!   - id: backend1
//!     group: WebserverGroup1
//!     kind: http
//!     upstream: backend1
//! ```

use std::collections::HashSet;
use std::path::Path;

use nasg_nginx::{UpstreamKind, UpstreamRef};
use serde::{Deserialize, Serialize};

use crate::error::SmokeError;

/// One group/upstream pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,

    /// Fragment of the Auto Scaling group name.
    pub group: String,

    pub kind: UpstreamKind,

    pub upstream: String,
}

impl Scenario {
    pub fn new(id: &str, group: &str, upstream: UpstreamRef) -> Self {
        Self {
            id: id.to_string(),
            group: group.to_string(),
            kind: upstream.kind,
            upstream: upstream.name,
        }
    }

    pub fn upstream_ref(&self) -> UpstreamRef {
        UpstreamRef::new(self.kind, self.upstream.clone())
    }
}

/// The three backends of the reference deployment.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("backend1", "WebserverGroup1", UpstreamRef::http("backend1")),
        Scenario::new("backend2", "WebserverGroup2", UpstreamRef::http("backend2")),
        Scenario::new(
            "tcp-backend",
            "WebserverGroup3",
            UpstreamRef::stream("tcp-backend"),
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenarios: Vec<Scenario>,
}

/// Parse and validate scenarios from YAML.
pub fn parse_scenarios(yaml: &str) -> Result<Vec<Scenario>, String> {
    let file: ScenarioFile = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    validate_scenarios(&file.scenarios)?;
    Ok(file.scenarios)
}

/// Load scenarios from a YAML file.
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, SmokeError> {
    let file_error = |message: String| SmokeError::ScenarioFile {
        path: path.display().to_string(),
        message,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    parse_scenarios(&contents).map_err(file_error)
}

/// Reject empty lists, empty fields and duplicate ids.
pub fn validate_scenarios(scenarios: &[Scenario]) -> Result<(), String> {
    if scenarios.is_empty() {
        return Err("there are no scenarios".to_string());
    }

    let mut seen = HashSet::new();
    for scenario in scenarios {
        if scenario.id.trim().is_empty() {
            return Err("The mandatory field id is either empty or missing for a scenario".into());
        }
        if scenario.group.trim().is_empty() {
            return Err(format!(
                "The mandatory field group is either empty or missing for the scenario {}",
                scenario.id
            ));
        }
        if scenario.upstream.trim().is_empty() {
            return Err(format!(
                "The mandatory field upstream is either empty or missing for the scenario {}",
                scenario.id
            ));
        }
        if !seen.insert(scenario.id.as_str()) {
            return Err(format!("duplicate scenario id {}", scenario.id));
        }
    }

    Ok(())
}

/// Keep only the scenarios whose id is listed; an empty list keeps all.
pub fn select(scenarios: Vec<Scenario>, only: &[String]) -> Result<Vec<Scenario>, SmokeError> {
    if only.is_empty() {
        return Ok(scenarios);
    }

    if let Some(unknown) = only.iter().find(|id| !scenarios.iter().any(|s| &s.id == *id)) {
        return Err(SmokeError::InvalidArguments(format!(
            "unknown scenario {unknown}"
        )));
    }

    Ok(scenarios
        .into_iter()
        .filter(|s| only.contains(&s.id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix() {
        let scenarios = default_scenarios();
        let paths: Vec<String> = scenarios.iter().map(|s| s.upstream_ref().path()).collect();

        assert_eq!(
            paths,
            vec![
                "/http/upstreams/backend1",
                "/http/upstreams/backend2",
                "/stream/upstreams/tcp-backend",
            ]
        );
        assert_eq!(scenarios[2].group, "WebserverGroup3");
        validate_scenarios(&scenarios).unwrap();
    }

    #[test]
    fn test_parse_yaml() {
        let scenarios = parse_scenarios(
            r#"
scenarios:
  - id: web
    group: WebGroup
    kind: http
    upstream: web
  - id: tcp
    group: TcpGroup
    kind: stream
    upstream: tcp
"#,
        )
        .unwrap();

        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[1].upstream_ref(), UpstreamRef::stream("tcp"));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let bad_kind = "scenarios:\n  - {id: a, group: g, kind: tcp, upstream: u}\n";
        assert!(parse_scenarios(bad_kind).is_err());

        let duplicate = "scenarios:\n  - {id: a, group: g, kind: http, upstream: u}\n  - {id: a, group: h, kind: http, upstream: v}\n";
        assert_eq!(
            parse_scenarios(duplicate).unwrap_err(),
            "duplicate scenario id a"
        );

        let empty_group = "scenarios:\n  - {id: a, group: '', kind: http, upstream: u}\n";
        assert!(parse_scenarios(empty_group).unwrap_err().contains("group"));

        assert!(parse_scenarios("scenarios: []").is_err());
    }

    #[test]
    fn test_select() {
        let picked = select(default_scenarios(), &["tcp-backend".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "tcp-backend");

        assert_eq!(select(default_scenarios(), &[]).unwrap().len(), 3);
        assert!(select(default_scenarios(), &["nope".to_string()]).is_err());
    }
}

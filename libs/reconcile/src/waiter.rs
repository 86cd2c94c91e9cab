//! Declarative waiters.
//!
//! A waiter repeatedly calls an operation and feeds each response through a
//! list of acceptors. The first acceptor that matches decides whether the
//! waiter succeeds, fails or keeps going. Models are written in the waiter
//! v2 JSON layout used by the AWS SDKs:
//!
//! ```json
//! {
//!   "version": 2,
//!   "waiters": {
//!     "autoscaling_completed": {
//!       "operation": "DescribeAutoScalingGroups",
//!       "delay": 5,
//!       "maxAttempts": 20,
//!       "acceptors": [
//!         { "matcher": "path", "argument": "...", "expected": true, "state": "success" }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Path arguments are JMESPath expressions evaluated against the JSON
//! response document.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// The only waiter config version understood.
pub const WAITER_CONFIG_VERSION: u32 = 2;

/// Waiter errors.
#[derive(Debug, Error)]
pub enum WaiterError {
    #[error("Waiter {name} failed: Max attempts exceeded ({attempts})")]
    MaxAttemptsExceeded { name: String, attempts: u32 },

    #[error("Waiter {name} failed: Waiter encountered a terminal failure state")]
    FailureState { name: String },

    #[error("Waiter {name} failed: An error occurred ({}): {message}", .code.as_deref().unwrap_or("Unknown"))]
    Unexpected {
        name: String,
        code: Option<String>,
        message: String,
    },

    #[error("invalid expression `{expression}`: {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("acceptor with matcher `{0}` requires an argument")]
    MissingArgument(Matcher),

    #[error("invalid waiter config: {0}")]
    InvalidConfig(String),

    #[error("waiter `{0}` is not defined")]
    UnknownWaiter(String),
}

/// A set of named waiter models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiterConfig {
    pub version: u32,
    pub waiters: BTreeMap<String, WaiterModel>,
}

impl WaiterConfig {
    /// Parse and validate a waiter config from JSON.
    pub fn from_json(json: &str) -> Result<Self, WaiterError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WaiterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config holding a single waiter.
    pub fn single(name: impl Into<String>, model: WaiterModel) -> Self {
        let mut waiters = BTreeMap::new();
        waiters.insert(name.into(), model);
        Self {
            version: WAITER_CONFIG_VERSION,
            waiters,
        }
    }

    /// Check version and per-waiter constraints.
    pub fn validate(&self) -> Result<(), WaiterError> {
        if self.version != WAITER_CONFIG_VERSION {
            return Err(WaiterError::InvalidConfig(format!(
                "unsupported version {}, expected {}",
                self.version, WAITER_CONFIG_VERSION
            )));
        }

        for (name, model) in &self.waiters {
            model
                .validate()
                .map_err(|e| WaiterError::InvalidConfig(format!("waiter {name}: {e}")))?;
        }

        Ok(())
    }

    /// Look up a waiter by name.
    pub fn waiter(&self, name: &str) -> Result<&WaiterModel, WaiterError> {
        self.waiters
            .get(name)
            .ok_or_else(|| WaiterError::UnknownWaiter(name.to_string()))
    }
}

/// A single waiter definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterModel {
    /// Name of the polled operation (informational).
    pub operation: String,

    /// Seconds to sleep between attempts.
    pub delay: u64,

    /// Total number of calls before giving up.
    pub max_attempts: u32,

    /// Rules evaluated in order against each response.
    pub acceptors: Vec<Acceptor>,
}

/// Matching strategy of an acceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Matcher {
    /// The expression result equals `expected`.
    Path,
    /// The expression yields a non-empty list whose elements all equal `expected`.
    PathAll,
    /// The expression yields a list with at least one element equal to `expected`.
    PathAny,
    /// The operation failed with error code `expected`.
    Error,
}

impl Matcher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::PathAll => "pathAll",
            Self::PathAny => "pathAny",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when an acceptor matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorState {
    Success,
    Retry,
    Failure,
}

/// One waiter rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acceptor {
    pub matcher: Matcher,

    /// JMESPath expression for the path matchers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,

    pub expected: Value,

    pub state: AcceptorState,
}

impl Acceptor {
    /// A `path` acceptor.
    pub fn path(argument: impl Into<String>, expected: Value, state: AcceptorState) -> Self {
        Self {
            matcher: Matcher::Path,
            argument: Some(argument.into()),
            expected,
            state,
        }
    }

    /// A `pathAll` acceptor.
    pub fn path_all(argument: impl Into<String>, expected: Value, state: AcceptorState) -> Self {
        Self {
            matcher: Matcher::PathAll,
            ..Self::path(argument, expected, state)
        }
    }

    /// A `pathAny` acceptor.
    pub fn path_any(argument: impl Into<String>, expected: Value, state: AcceptorState) -> Self {
        Self {
            matcher: Matcher::PathAny,
            ..Self::path(argument, expected, state)
        }
    }

    /// An `error` acceptor matching an error code.
    pub fn error(code: impl Into<String>, state: AcceptorState) -> Self {
        Self {
            matcher: Matcher::Error,
            argument: None,
            expected: Value::String(code.into()),
            state,
        }
    }

    /// Check this acceptor against one operation outcome.
    pub fn matches(&self, outcome: &Result<Value, OperationFailure>) -> Result<bool, WaiterError> {
        match (self.matcher, outcome) {
            (Matcher::Error, Err(failure)) => Ok(match &self.expected {
                // `true` accepts any error.
                Value::Bool(any) => *any,
                Value::String(code) => failure.code.as_deref() == Some(code.as_str()),
                _ => false,
            }),
            (Matcher::Error, Ok(_)) => Ok(self.expected == Value::Bool(false)),
            (_, Err(_)) => Ok(false),
            (matcher, Ok(document)) => {
                let argument = self
                    .argument
                    .as_deref()
                    .ok_or(WaiterError::MissingArgument(matcher))?;
                let found = search(argument, document)?;

                Ok(match matcher {
                    Matcher::Path => json_eq(&found, &self.expected),
                    Matcher::PathAll => match &found {
                        Value::Array(items) => {
                            !items.is_empty() && items.iter().all(|v| json_eq(v, &self.expected))
                        }
                        _ => false,
                    },
                    Matcher::PathAny => match &found {
                        Value::Array(items) => items.iter().any(|v| json_eq(v, &self.expected)),
                        _ => false,
                    },
                    Matcher::Error => false,
                })
            }
        }
    }
}

/// An operation that did not produce a response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// Service error code, when the service sent one.
    pub code: Option<String>,
    pub message: String,
}

impl OperationFailure {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl WaiterModel {
    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("maxAttempts must be at least 1".to_string());
        }
        if self.acceptors.is_empty() {
            return Err("at least one acceptor is required".to_string());
        }
        for acceptor in &self.acceptors {
            if acceptor.matcher != Matcher::Error && acceptor.argument.is_none() {
                return Err(format!(
                    "acceptor with matcher `{}` requires an argument",
                    acceptor.matcher
                ));
            }
        }
        Ok(())
    }

    /// Find the state selected by the first matching acceptor.
    pub fn evaluate(
        &self,
        outcome: &Result<Value, OperationFailure>,
    ) -> Result<Option<AcceptorState>, WaiterError> {
        for acceptor in &self.acceptors {
            if acceptor.matches(outcome)? {
                return Ok(Some(acceptor.state));
            }
        }
        Ok(None)
    }

    /// Run the waiter to completion.
    ///
    /// Returns the number of attempts used on success.
    pub async fn wait<F, Fut>(&self, name: &str, mut operation: F) -> Result<u32, WaiterError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value, OperationFailure>>,
    {
        for attempt in 1..=self.max_attempts {
            let outcome = operation().await;
            let state = self.evaluate(&outcome)?;
            debug!(
                waiter = name,
                operation = %self.operation,
                attempt,
                max_attempts = self.max_attempts,
                state = ?state,
                "Waiter attempt"
            );

            match state {
                Some(AcceptorState::Success) => {
                    info!(waiter = name, attempt, "Waiter reached success state");
                    return Ok(attempt);
                }
                Some(AcceptorState::Failure) => {
                    return Err(WaiterError::FailureState {
                        name: name.to_string(),
                    });
                }
                Some(AcceptorState::Retry) => {}
                None => {
                    if let Err(failure) = outcome {
                        return Err(WaiterError::Unexpected {
                            name: name.to_string(),
                            code: failure.code,
                            message: failure.message,
                        });
                    }
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay()).await;
            }
        }

        Err(WaiterError::MaxAttemptsExceeded {
            name: name.to_string(),
            attempts: self.max_attempts,
        })
    }
}

/// Evaluate a JMESPath expression against a JSON document.
pub fn search(expression: &str, document: &Value) -> Result<Value, WaiterError> {
    let invalid = |message: String| WaiterError::InvalidExpression {
        expression: expression.to_string(),
        message,
    };

    let compiled = jmespath::compile(expression).map_err(|e| invalid(e.to_string()))?;
    let found = compiled.search(document).map_err(|e| invalid(e.to_string()))?;
    serde_json::to_value(&*found).map_err(|e| invalid(e.to_string()))
}

/// JSON equality that treats `5` and `5.0` as the same number.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

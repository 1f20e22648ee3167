//! Security guard evaluated before tool execution.

use std::sync::{Arc, PoisonError, RwLock};

use agent_config::SecurityConfig;
use agent_primitives::{Schema, Violation};
use agent_telemetry::{EventDispatcher, SecurityEvent, SecurityObserver};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::arguments::ArgumentError;
use crate::decision::{AccessDecision, DenyRule};
use crate::pollution::contains_dangerous_keys;

/// Parameters rejected by a tool schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFailure {
    message: String,
    violations: Vec<Violation>,
}

impl ValidationFailure {
    fn new(tool: &str, violations: Vec<Violation>) -> Self {
        let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();
        Self {
            message: format!(
                "Invalid parameters for tool `{tool}`: {}",
                rendered.join("; ")
            ),
            violations,
        }
    }

    /// Returns the human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the individual field violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// Policy gate consulted before a tool runs.
///
/// The configuration is owned by the guard and only ever exchanged by value.
#[derive(Debug)]
pub struct SecurityGuard {
    config: RwLock<SecurityConfig>,
    events: EventDispatcher,
}

impl Default for SecurityGuard {
    fn default() -> Self {
        Self::new(SecurityConfig::default())
    }
}

impl SecurityGuard {
    /// Creates a guard that reports events through tracing.
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: RwLock::new(config),
            events: EventDispatcher::tracing(),
        }
    }

    /// Routes security events to `observer` instead of tracing.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SecurityObserver>) -> Self {
        self.events = EventDispatcher::new(observer);
        self
    }

    /// Replaces the event dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> SecurityConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the configuration.
    pub fn set_config(&self, config: SecurityConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Evaluates the deny list, then the allow list, for `name`.
    ///
    /// Deny-list hits raise [`SecurityEvent::ExecutionBlocked`].
    pub fn evaluate_tool(&self, name: &str) -> AccessDecision {
        let decision = {
            let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if !config.enabled {
                AccessDecision::Allow
            } else if config.is_denied(name) {
                AccessDecision::Deny {
                    rule: DenyRule::DenyList,
                }
            } else if config.is_outside_allowlist(name) {
                AccessDecision::Deny {
                    rule: DenyRule::AllowList,
                }
            } else {
                AccessDecision::Allow
            }
        };

        if let Some(rule) = decision.rule() {
            debug!(tool = name, reason = rule.reason(), "tool rejected by guard");
            if rule == DenyRule::DenyList {
                self.events.emit(SecurityEvent::ExecutionBlocked {
                    tool: name.to_owned(),
                    reason: rule.reason().to_owned(),
                });
            }
        }

        decision
    }

    /// Returns `true` when `name` may run.
    pub fn is_tool_allowed(&self, name: &str) -> bool {
        self.evaluate_tool(name).is_allow()
    }

    /// Validates `params` against `schema`.
    ///
    /// Returns the input unchanged when the guard or parameter validation is
    /// disabled; otherwise returns the value produced by the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] listing one violation per offending
    /// field, and raises [`SecurityEvent::ValidationFailed`].
    pub fn validate_params(
        &self,
        name: &str,
        params: Value,
        schema: &dyn Schema,
    ) -> Result<Value, ValidationFailure> {
        let active = {
            let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
            config.enabled && config.validate_params
        };
        if !active {
            return Ok(params);
        }

        schema.validate(&params).map_err(|violations| {
            let failure = ValidationFailure::new(name, violations);
            self.events.emit(SecurityEvent::ValidationFailed {
                tool: name.to_owned(),
                message: failure.message().to_owned(),
            });
            failure
        })
    }

    /// Parses untrusted argument text produced for tool `name`.
    ///
    /// With the guard disabled the text is parsed as-is. Otherwise the result
    /// must be a JSON object free of prototype-pollution keys.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidJson`] (raising
    /// [`SecurityEvent::ValidationFailed`]), [`ArgumentError::NotAnObject`],
    /// or [`ArgumentError::MaliciousContent`] (raising
    /// [`SecurityEvent::PrototypePollution`]).
    pub fn parse_tool_arguments(&self, name: &str, text: &str) -> Result<Value, ArgumentError> {
        let enabled = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled;

        let parsed: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(source) => {
                let err = ArgumentError::InvalidJson { source };
                if enabled {
                    self.events.emit(SecurityEvent::ValidationFailed {
                        tool: name.to_owned(),
                        message: err.to_string(),
                    });
                }
                return Err(err);
            }
        };

        if !enabled {
            return Ok(parsed);
        }

        if !parsed.is_object() {
            return Err(ArgumentError::NotAnObject);
        }

        if contains_dangerous_keys(&parsed) {
            self.events.emit(SecurityEvent::PrototypePollution {
                tool: name.to_owned(),
            });
            return Err(ArgumentError::MaliciousContent);
        }

        Ok(parsed)
    }

    /// Adds `name` to the deny list.
    pub fn deny_tool(&self, name: &str) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        if !config.is_denied(name) {
            config.denied_tools.push(name.to_owned());
        }
    }

    /// Removes `name` from the deny list and, when a whitelist is
    /// configured, adds it there.
    pub fn allow_tool(&self, name: &str) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.denied_tools.retain(|tool| tool != name);
        if let Some(allowed) = config.allowed_tools.as_mut() {
            if !allowed.iter().any(|tool| tool == name) {
                allowed.push(name.to_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::{ParameterSchema, PropertySchema};
    use agent_telemetry::{CollectingObserver, SecurityEventKind};
    use serde_json::json;

    fn guarded(config: SecurityConfig) -> (SecurityGuard, Arc<CollectingObserver>) {
        let collector = CollectingObserver::new();
        let guard = SecurityGuard::new(config).with_observer(collector.clone());
        (guard, collector)
    }

    fn echo_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with_required_property("value", PropertySchema::string("Text to echo"))
            .with_property("times", PropertySchema::integer("Repetitions"))
    }

    #[test]
    fn deny_list_blocks_and_notifies() {
        let (guard, events) = guarded(SecurityConfig::default().with_denied_tools(["rm"]));

        assert!(!guard.is_tool_allowed("rm"));
        assert!(guard.is_tool_allowed("ls"));
        assert_eq!(events.count(SecurityEventKind::ExecutionBlocked), 1);
    }

    #[test]
    fn deny_list_takes_precedence_over_allow_list() {
        let (guard, _) = guarded(
            SecurityConfig::default()
                .with_allowed_tools(["rm", "ls"])
                .with_denied_tools(["rm"]),
        );

        assert_eq!(
            guard.evaluate_tool("rm").rule(),
            Some(DenyRule::DenyList)
        );
        assert!(guard.is_tool_allowed("ls"));
        assert_eq!(
            guard.evaluate_tool("cat").rule(),
            Some(DenyRule::AllowList)
        );
    }

    #[test]
    fn allow_list_miss_does_not_notify() {
        let (guard, events) = guarded(SecurityConfig::default().with_allowed_tools(["ls"]));
        assert!(!guard.is_tool_allowed("cat"));
        assert!(events.events().is_empty());
    }

    #[test]
    fn disabled_guard_allows_everything() {
        let (guard, events) = guarded(SecurityConfig::disabled().with_denied_tools(["rm"]));
        assert!(guard.is_tool_allowed("rm"));
        assert!(events.events().is_empty());
    }

    #[test]
    fn deny_and_allow_are_idempotent() {
        let (guard, _) = guarded(SecurityConfig::default());

        guard.deny_tool("rm");
        guard.deny_tool("rm");
        assert_eq!(guard.config().denied_tools, vec!["rm".to_owned()]);
        assert!(!guard.is_tool_allowed("rm"));

        guard.allow_tool("rm");
        guard.allow_tool("rm");
        assert!(guard.config().denied_tools.is_empty());
        assert!(guard.config().allowed_tools.is_none());
        assert!(guard.is_tool_allowed("rm"));
    }

    #[test]
    fn allow_tool_extends_configured_whitelist() {
        let (guard, _) = guarded(SecurityConfig::default().with_allowed_tools(["ls"]));
        assert!(!guard.is_tool_allowed("cat"));

        guard.allow_tool("cat");
        guard.allow_tool("cat");
        assert_eq!(
            guard.config().allowed_tools,
            Some(vec!["ls".to_owned(), "cat".to_owned()])
        );
        assert!(guard.is_tool_allowed("cat"));
    }

    #[test]
    fn config_is_exchanged_by_value() {
        let (guard, _) = guarded(SecurityConfig::default());
        let mut snapshot = guard.config();
        snapshot.denied_tools.push("rm".into());
        assert!(guard.is_tool_allowed("rm"));

        guard.set_config(snapshot);
        assert!(!guard.is_tool_allowed("rm"));
    }

    #[test]
    fn validation_returns_schema_output() {
        let (guard, events) = guarded(SecurityConfig::default());
        let params = json!({ "value": "hi", "times": 2 });
        let validated = guard
            .validate_params("echo", params.clone(), &echo_schema())
            .unwrap();
        assert_eq!(validated, params);
        assert!(events.events().is_empty());
    }

    #[test]
    fn validation_lists_violations_per_field() {
        let (guard, events) = guarded(SecurityConfig::default());
        let failure = guard
            .validate_params("echo", json!({ "times": "x" }), &echo_schema())
            .unwrap_err();

        assert_eq!(failure.violations().len(), 2);
        assert_eq!(
            failure.message(),
            "Invalid parameters for tool `echo`: value: required; times: expected integer, received string"
        );
        assert_eq!(events.count(SecurityEventKind::ValidationFailed), 1);
    }

    #[test]
    fn validation_can_coerce() {
        let (guard, _) = guarded(SecurityConfig::default());
        let trim = |value: &Value| -> Result<Value, Vec<Violation>> {
            let text = value["value"].as_str().unwrap_or_default().trim().to_owned();
            Ok(json!({ "value": text }))
        };
        let validated = guard
            .validate_params("echo", json!({ "value": "  hi  " }), &trim)
            .unwrap();
        assert_eq!(validated, json!({ "value": "hi" }));
    }

    #[test]
    fn validation_bypassed_when_disabled() {
        let invalid = json!({ "times": "x" });
        let (guard, _) = guarded(SecurityConfig::default().with_validate_params(false));
        assert_eq!(
            guard
                .validate_params("echo", invalid.clone(), &echo_schema())
                .unwrap(),
            invalid
        );

        let (guard, _) = guarded(SecurityConfig::disabled());
        assert!(guard.validate_params("echo", invalid, &echo_schema()).is_ok());
    }

    #[test]
    fn parses_clean_object_arguments() {
        let (guard, _) = guarded(SecurityConfig::default());
        let parsed = guard.parse_tool_arguments("echo", r#"{"a":1}"#).unwrap();
        assert_eq!(parsed, json!({ "a": 1 }));
    }

    #[test]
    fn rejects_prototype_pollution_payloads() {
        let (guard, events) = guarded(SecurityConfig::default());
        for payload in [
            r#"{"__proto__":{"x":1}}"#,
            r#"{"constructor":{"prototype":{}}}"#,
            r#"{"a":{"b":{"__proto__":{}}}}"#,
        ] {
            let err = guard.parse_tool_arguments("echo", payload).unwrap_err();
            assert!(matches!(err, ArgumentError::MaliciousContent), "{payload}");
            assert_eq!(
                err.to_string(),
                "Invalid tool arguments: potentially malicious content detected"
            );
        }
        assert_eq!(events.count(SecurityEventKind::PrototypePollution), 3);
    }

    #[test]
    fn rejects_non_object_and_invalid_json() {
        let (guard, events) = guarded(SecurityConfig::default());

        for payload in ["[1,2]", "null", "42", r#""text""#] {
            let err = guard.parse_tool_arguments("echo", payload).unwrap_err();
            assert_eq!(err.to_string(), "Tool arguments must be a JSON object");
        }

        let err = guard.parse_tool_arguments("echo", "{not json").unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidJson { .. }));
        assert_eq!(err.to_string(), "Invalid JSON in tool arguments");
        assert_eq!(events.count(SecurityEventKind::ValidationFailed), 1);
    }

    #[test]
    fn disabled_guard_parses_without_screening() {
        let (guard, events) = guarded(SecurityConfig::disabled());
        let parsed = guard
            .parse_tool_arguments("echo", r#"{"__proto__":{"x":1}}"#)
            .unwrap();
        assert!(parsed.get("__proto__").is_some());
        assert_eq!(guard.parse_tool_arguments("echo", "[1]").unwrap(), json!([1]));
        assert!(events.events().is_empty());
    }
}

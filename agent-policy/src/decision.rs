//! Access decisions returned by the guard.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Rule that caused a tool to be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyRule {
    /// The tool appears on the deny list.
    DenyList,
    /// A whitelist is configured and the tool is not on it.
    AllowList,
}

impl DenyRule {
    /// Returns a human-readable explanation of the rule.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::DenyList => "tool is on the deny list",
            Self::AllowList => "tool is not on the allow list",
        }
    }
}

impl Display for DenyRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of evaluating whether a tool may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// The tool may run.
    Allow,
    /// The tool is rejected by `rule`.
    Deny {
        /// Rule responsible for the rejection.
        rule: DenyRule,
    },
}

impl AccessDecision {
    /// Returns true when the decision allows the tool to run.
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns true when the decision rejects the tool.
    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny { .. })
    }

    /// Returns the rule behind a denial.
    #[must_use]
    pub const fn rule(self) -> Option<DenyRule> {
        match self {
            Self::Allow => None,
            Self::Deny { rule } => Some(rule),
        }
    }

    /// Returns the explanation behind a denial.
    #[must_use]
    pub fn reason(self) -> Option<&'static str> {
        self.rule().map(DenyRule::reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_helpers_work() {
        let allow = AccessDecision::Allow;
        assert!(allow.is_allow());
        assert!(!allow.is_deny());
        assert!(allow.reason().is_none());

        let deny = AccessDecision::Deny {
            rule: DenyRule::DenyList,
        };
        assert!(deny.is_deny());
        assert_eq!(deny.reason(), Some("tool is on the deny list"));
        assert_eq!(deny.rule(), Some(DenyRule::DenyList));
    }

    #[test]
    fn serializes_with_decision_tag() {
        let value = serde_json::to_value(AccessDecision::Deny {
            rule: DenyRule::AllowList,
        })
        .unwrap();
        assert_eq!(value["decision"], "deny");
        assert_eq!(value["rule"], "allow_list");
    }
}

//! Execution identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Opaque token identifying one sandboxed tool execution.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Generates a random execution identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for ExecutionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "exec_{}", self.0.simple())
    }
}

impl From<Uuid> for ExecutionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ExecutionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("exec_").unwrap_or(s);
        let uuid = Uuid::parse_str(raw).map_err(Error::from)?;
        Ok(Self::from_uuid(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_execution_id() {
        let id = ExecutionId::random();
        let rendered = id.to_string();
        assert!(rendered.starts_with("exec_"));
        let parsed = rendered.parse::<ExecutionId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parses_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed = uuid.to_string().parse::<ExecutionId>().expect("parse");
        assert_eq!(parsed.as_uuid(), uuid);
    }

    #[test]
    fn rejects_garbage() {
        assert!("exec_not-a-uuid".parse::<ExecutionId>().is_err());
    }
}

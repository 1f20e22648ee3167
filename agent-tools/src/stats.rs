//! Per-tool usage accounting.

use std::time::Duration;

use serde::Serialize;

/// Running counters kept next to each registered tool.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UsageCounters {
    calls: u64,
    failures: u64,
    total_duration: Duration,
}

impl UsageCounters {
    pub(crate) fn record(&mut self, elapsed: Duration, success: bool) {
        self.calls += 1;
        if !success {
            self.failures += 1;
        }
        self.total_duration += elapsed;
    }

    pub(crate) const fn calls(&self) -> u64 {
        self.calls
    }

    pub(crate) fn snapshot(&self, name: &str) -> UsageStats {
        UsageStats {
            name: name.to_owned(),
            calls: self.calls,
            failures: self.failures,
            total_duration: self.total_duration,
        }
    }
}

/// Snapshot of a tool's usage since registration or the last reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    /// Tool name.
    pub name: String,
    /// Completed calls, successful or not.
    pub calls: u64,
    /// Calls that ended in an error.
    pub failures: u64,
    /// Wall-clock time spent across all calls.
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_ms")]
    pub total_duration: Duration,
}

impl UsageStats {
    /// Calls that succeeded.
    #[must_use]
    pub const fn successes(&self) -> u64 {
        self.calls - self.failures
    }

    /// Fraction of calls that succeeded; zero before the first call.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.successes() as f64 / self.calls as f64
    }

    /// Mean wall-clock time per call, or `None` before the first call.
    #[must_use]
    pub fn average_duration(&self) -> Option<Duration> {
        if self.calls == 0 {
            return None;
        }
        let calls = u32::try_from(self.calls).unwrap_or(u32::MAX);
        Some(self.total_duration / calls)
    }
}

fn serialize_ms<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

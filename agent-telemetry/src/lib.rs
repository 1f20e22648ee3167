//! Observability utilities for tool orchestration.
//!
//! Security components report noteworthy decisions as [`SecurityEvent`]s
//! through an [`EventDispatcher`]. Dispatch is best-effort: a panicking
//! observer is contained and never disturbs the execution path that raised
//! the event.

#![warn(missing_docs, clippy::pedantic)]

mod events;
mod logging;
mod observer;

pub use events::{SecurityEvent, SecurityEventKind};
pub use logging::{TelemetryError, TelemetryResult, init_tracing};
pub use observer::{
    CollectingObserver, CompositeObserver, EventDispatcher, SecurityObserver,
    TracingSecurityObserver,
};

//! Observers receiving security events.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use crate::events::{SecurityEvent, SecurityEventKind};

/// Receives security events raised by the guard and the sandbox.
pub trait SecurityObserver: Send + Sync {
    /// Records the supplied event.
    fn on_event(&self, event: &SecurityEvent);
}

/// Observer that writes every event to the tracing system.
#[derive(Debug, Default)]
pub struct TracingSecurityObserver;

impl SecurityObserver for TracingSecurityObserver {
    fn on_event(&self, event: &SecurityEvent) {
        warn!(kind = ?event.kind(), tool = event.tool().unwrap_or_default(), "{event}");
    }
}

/// Observer that retains events in memory.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<SecurityEvent>>,
}

impl CollectingObserver {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts recorded events of the given kind.
    #[must_use]
    pub fn count(&self, kind: SecurityEventKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SecurityObserver for CollectingObserver {
    fn on_event(&self, event: &SecurityEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Forwards events to a collection of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn SecurityObserver>>,
}

impl CompositeObserver {
    /// Creates a composite observer from the supplied list.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn SecurityObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer to the composite set.
    pub fn push(&mut self, observer: Arc<dyn SecurityObserver>) {
        self.observers.push(observer);
    }
}

impl SecurityObserver for CompositeObserver {
    fn on_event(&self, event: &SecurityEvent) {
        for observer in &self.observers {
            dispatch(observer.as_ref(), event);
        }
    }
}

/// Best-effort fan-out point owned by each security component.
///
/// An empty dispatcher drops events. Panics raised by observers are caught
/// and logged so they never reach the caller of the guarded operation.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    observer: Option<Arc<dyn SecurityObserver>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("observer_configured", &self.observer.is_some())
            .finish()
    }
}

impl EventDispatcher {
    /// Creates a dispatcher forwarding to `observer`.
    #[must_use]
    pub fn new(observer: Arc<dyn SecurityObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Creates a dispatcher that logs through [`TracingSecurityObserver`].
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSecurityObserver))
    }

    /// Returns `true` when an observer is attached.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.observer.is_some()
    }

    /// Delivers `event` to the attached observer, if any.
    pub fn emit(&self, event: SecurityEvent) {
        if let Some(observer) = &self.observer {
            dispatch(observer.as_ref(), &event);
        }
    }
}

fn dispatch(observer: &dyn SecurityObserver, event: &SecurityEvent) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_event(event))).is_err() {
        error!(kind = ?event.kind(), "security observer panicked; event dropped");
    }
}

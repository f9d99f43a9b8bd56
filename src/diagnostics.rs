use std::fmt;
use tracing::{debug, warn};

/// Infrastructure failure the widget swallowed instead of showing the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    StorageRead { key: String, reason: String },
    StorageWrite { key: String, reason: String },
    ForwardDispatch { reason: String },
    ChatUnavailable { reason: String },
}

impl DiagnosticEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StorageRead { .. } => "storage_read",
            Self::StorageWrite { .. } => "storage_write",
            Self::ForwardDispatch { .. } => "forward_dispatch",
            Self::ChatUnavailable { .. } => "chat_unavailable",
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageRead { key, reason } => write!(f, "reading {key} failed: {reason}"),
            Self::StorageWrite { key, reason } => write!(f, "writing {key} failed: {reason}"),
            Self::ForwardDispatch { reason } => write!(f, "contact forward not sent: {reason}"),
            Self::ChatUnavailable { reason } => write!(f, "chat surface not opened: {reason}"),
        }
    }
}

/// Non-blocking hook for swallowed failures. Must never panic or block.
pub trait DiagnosticSink {
    fn report(&self, event: DiagnosticEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn report(&self, _event: DiagnosticEvent) {}
}

/// Emits every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        match &event {
            // The SDK script loads async, so an early click is routine.
            DiagnosticEvent::ChatUnavailable { .. } => {
                debug!(target: "docs_support::widget", kind = event.kind(), "{event}")
            }
            _ => warn!(target: "docs_support::widget", kind = event.kind(), "{event}"),
        }
    }
}

/// Keeps events in memory; clones share the buffer.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    events: std::rc::Rc<std::cell::RefCell<Vec<DiagnosticEvent>>>,
}

#[cfg(test)]
impl RecordingDiagnostics {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.borrow().clone()
    }
}

#[cfg(test)]
impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        self.events.borrow_mut().push(event);
    }
}

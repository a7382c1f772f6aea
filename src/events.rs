//! Observability events emitted around lifecycle dispatch
//!
//! Events are fire-and-forget: the engine never blocks on or reacts to
//! a sink, so UIs and log pipelines plug in without the engine
//! depending on them.

use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Lifecycle operation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Refresh,
    Update,
    Changed,
    Destroy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Refresh => "refresh",
            Self::Update => "update",
            Self::Changed => "changed",
            Self::Destroy => "destroy",
        };
        write!(f, "{s}")
    }
}

/// Where in the dispatch the event fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Success,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Success => "success",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// An immutable observability record
#[derive(Debug, Clone)]
pub struct ParserEvent {
    pub operation: Operation,
    pub resource_type: String,
    pub resource_id: String,
    pub phase: Phase,
    /// Elapsed time of the dispatch; zero for `Start` events
    pub duration: Duration,
    pub error: Option<String>,
    /// Serialized resource data, where available
    pub data: Option<Value>,
}

/// Sink receiving lifecycle events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ParserEvent);
}

/// Sink that drops every event
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: ParserEvent) {}
}

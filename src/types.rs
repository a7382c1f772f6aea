//! Core types shared across the engine

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Lifecycle status of a resource
///
/// Persisted with the resource after every run so a failed create is
/// retried on the next run, and a resource removed from configuration
/// while `Created` stays eligible for destroy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Declared but not yet reconciled with a provider
    Pending,
    /// Last provider operation succeeded
    Created,
    /// Last provider operation failed
    Failed,
}

impl Default for Status {
    fn default() -> Self {
        Self::Pending
    }
}

/// Options for the graph walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Number of parallel jobs for sibling nodes
    pub jobs: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

/// Cancellation/deadline context handed to provider operations
///
/// The walker never pre-empts an in-flight operation; providers are
/// expected to check `is_cancelled` at their own suspension points and
/// return promptly.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that cancels once `deadline` passes
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Check whether the operation should stop
    pub fn is_cancelled(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Summary of a lifecycle run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl ApplySummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.destroyed
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ApplySummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.destroyed += other.destroyed;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_default_is_pending() {
        assert_eq!(Status::default(), Status::Pending);
    }

    #[test]
    fn test_op_context_deadline() {
        let ctx = OpContext::new();
        assert!(!ctx.is_cancelled());

        let ctx = OpContext::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_summary_merge() {
        let mut a = ApplySummary {
            created: 1,
            ..Default::default()
        };
        let b = ApplySummary {
            destroyed: 2,
            failed: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.total_changes(), 3);
        assert!(!a.is_success());
    }
}

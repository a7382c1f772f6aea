//! Graph engine
//!
//! The engine drives a parsed resource set end to end:
//! 1. Building - turn references, explicit dependencies, and module
//!    containment into an acyclic dependency graph
//! 2. Walking - topological, concurrency-permitting traversal that
//!    resolves references and decodes each resource
//! 3. Orchestrating - diff against persisted state and dispatch
//!    create/refresh/update/destroy to providers

pub mod builder;
pub mod orchestrator;
pub mod walker;

pub use builder::{Graph, build};
pub use orchestrator::Orchestrator;
pub use walker::Walker;

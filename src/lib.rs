//! # Rigging
//!
//! A concurrent engine for declarative infrastructure configuration.
//!
//! This crate parses a set of declared resources, resolves the
//! references between them, orders them into a dependency graph, and
//! converges each one against its provider, in parallel where the graph
//! allows.
//!
//! ## Core Concepts
//!
//! - **Fqrn**: A fully qualified resource name like
//!   `module.infra.resource.container.app`
//! - **Resource**: One declared block with metadata, an undecoded body,
//!   and decoded fields
//! - **Config**: The ordered store of all resources in a run
//! - **Walker**: Visits the dependency graph in topological order,
//!   decoding bodies against each module's evaluation context
//! - **Orchestrator**: Diffs against persisted state and drives
//!   create/refresh/update/destroy through providers
//!
//! ## Example
//!
//! ```ignore
//! use rigging::{Config, Orchestrator, ProviderRegistry, Resource};
//! use rigging::state::FileState;
//! use std::sync::Arc;
//!
//! let mut config = Config::new();
//! config.append(Resource::resource("network", "cloud"))?;
//! config.append(
//!     Resource::resource("container", "app")
//!         .with_depends_on(["resource.network.cloud"]),
//! )?;
//! rigging::scanner::scan_all(&config)?;
//!
//! let providers = ProviderRegistry::new()
//!     .with("network", Arc::new(NetworkProvider))
//!     .with("container", Arc::new(ContainerProvider));
//! let state = Box::new(FileState::new("state.json"));
//!
//! let summary = Orchestrator::new(providers, state).apply(&config)?;
//! println!("{} resources created", summary.created);
//! ```
//!
//! ## Collaborator Traits
//!
//! The engine never performs side effects itself; everything external
//! goes through a trait:
//!
//! - [`Provider`]: Implements create/refresh/update/destroy for one
//!   resource type, over serialized bytes
//! - [`State`](state::State): Loads and saves the persisted resource
//!   set between runs
//! - [`EventSink`](events::EventSink): Receives lifecycle events for
//!   logging or UIs

pub mod context;
pub mod engine;
pub mod errors;
pub mod events;
pub mod expr;
pub mod fqrn;
pub mod provider;
pub mod resource;
pub mod scanner;
pub mod state;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use engine::{Graph, Orchestrator, Walker, build};
pub use errors::{Diagnostic, Diagnostics, Error, Result, Severity};
pub use expr::{Block, Body, Expr};
pub use fqrn::{Fqrn, Kind};
pub use provider::{Provider, ProviderRegistry};
pub use resource::{Metadata, Resource, SharedResource};
pub use store::Config;
pub use types::{ApplySummary, OpContext, Status, WalkOptions};

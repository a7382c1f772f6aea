//! Provider collaborator
//!
//! A provider implements the actual side effects for a resource type.
//! Every operation exchanges serialized resource bytes, never the live
//! in-memory value, so in-process and out-of-process providers stay
//! interchangeable.

use crate::errors::{Error, Result};
use crate::resource::Resource;
use crate::types::OpContext;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle operations for one resource type
///
/// Operations take an [`OpContext`] carrying an optional deadline;
/// implementations should check it at their own suspension points and
/// return promptly once cancelled.
pub trait Provider: Send + Sync {
    /// Check a serialized resource before any create/update
    fn validate(&self, data: &[u8], ctx: &OpContext) -> anyhow::Result<()>;

    /// Create the resource, returning its updated serialized form
    fn create(&self, data: &[u8], ctx: &OpContext) -> anyhow::Result<Vec<u8>>;

    /// Destroy the resource; `force` skips graceful teardown
    fn destroy(&self, data: &[u8], force: bool, ctx: &OpContext) -> anyhow::Result<()>;

    /// Re-read remote state, returning the refreshed serialized form
    fn refresh(&self, data: &[u8], ctx: &OpContext) -> anyhow::Result<Vec<u8>>;

    /// Apply in-place changes, returning the updated serialized form
    fn update(&self, data: &[u8], ctx: &OpContext) -> anyhow::Result<Vec<u8>>;

    /// Compare two serialized forms of the same resource
    fn changed(&self, old: &[u8], new: &[u8]) -> anyhow::Result<bool>;
}

/// Maps resource type names to providers
///
/// A resource may name its provider explicitly through a `provider`
/// field; otherwise the default registered under its type name is used.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a type name
    pub fn register(&mut self, type_name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(type_name.into(), provider);
    }

    /// Builder-style registration
    pub fn with(mut self, type_name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.register(type_name, provider);
        self
    }

    /// Resolve the provider for a resource
    pub fn resolve(&self, resource: &Resource) -> Result<Arc<dyn Provider>> {
        let name = resource
            .fields
            .get("provider")
            .and_then(|v| v.as_str())
            .map_or_else(
                || resource.meta().kind.type_label().to_string(),
                str::to_string,
            );
        self.providers
            .get(&name)
            .cloned()
            .ok_or(Error::ProviderNotFound(name))
    }

    /// Resolve by explicit provider name or type name
    pub fn resolve_named(&self, provider: Option<&str>, type_name: &str) -> Result<Arc<dyn Provider>> {
        let name = provider.unwrap_or(type_name);
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProviderNotFound(name.to_string()))
    }
}

//! Ordered resource store with identity-based lookup
//!
//! The store owns every declared resource in append order, and order is
//! preserved across removal. Lookup is exact (`find`) or lexically
//! scoped (`find_relative`): a reference written inside a nested module
//! resolves against its own module first, then each ancestor, then the
//! root, so authors never need to know their own nesting.

use crate::errors::{Error, Result};
use crate::fqrn::{Fqrn, Kind};
use crate::resource::{Resource, SharedResource, read, shared};

/// Append-ordered collection of resources
///
/// The backing sequence is mutated only during the single-threaded
/// parse/build phase; the concurrent walk only reads it.
#[derive(Debug, Default)]
pub struct Config {
    resources: Vec<SharedResource>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource, rejecting ID collisions
    pub fn append(&mut self, resource: Resource) -> Result<SharedResource> {
        let id = resource.id();
        if self.resources.iter().any(|r| read(r).id() == id) {
            return Err(Error::ResourceExists(id));
        }
        let handle = shared(resource);
        self.resources.push(handle.clone());
        Ok(handle)
    }

    /// Remove a resource by identity, preserving the order of the rest
    pub fn remove(&mut self, id: &str) -> Result<SharedResource> {
        let position = self
            .resources
            .iter()
            .position(|r| read(r).id() == id)
            .ok_or_else(|| Error::ResourceNotFound(id.to_string()))?;
        Ok(self.resources.remove(position))
    }

    /// Exact lookup by FQRN string
    pub fn find(&self, fqrn: &str) -> Result<SharedResource> {
        let parsed = Fqrn::parse(fqrn)?;
        self.find_fqrn(&parsed)
            .ok_or_else(|| Error::ResourceNotFound(fqrn.to_string()))
    }

    /// Exact lookup by parsed FQRN, ignoring any attribute path
    pub fn find_fqrn(&self, fqrn: &Fqrn) -> Option<SharedResource> {
        let id = fqrn.to_string_without_attribute();
        self.resources.iter().find(|r| read(r).id() == id).cloned()
    }

    /// Resolve a possibly module-unaware reference against `from_module`
    ///
    /// Tries the reference under `from_module`, then each successively
    /// shorter ancestor path, finally the root.
    pub fn find_relative(&self, fqrn: &str, from_module: &str) -> Result<SharedResource> {
        let parsed = Fqrn::parse(fqrn)?;
        for prefix in module_prefixes(from_module) {
            let mut candidate = parsed.clone();
            if !prefix.is_empty() {
                candidate.append_parent_module(&prefix);
            }
            if let Some(found) = self.find_fqrn(&candidate) {
                return Ok(found);
            }
        }
        Err(Error::ResourceNotFound(fqrn.to_string()))
    }

    /// All resources of a given user-declared type
    pub fn find_by_type(&self, type_name: &str) -> Vec<SharedResource> {
        self.resources
            .iter()
            .filter(|r| matches!(&read(r).meta().kind, Kind::Resource(t) if t == type_name))
            .cloned()
            .collect()
    }

    /// All resources contained in the module a `Kind::Module` FQRN
    /// addresses, optionally including nested sub-modules
    pub fn find_module_resources(
        &self,
        module_fqrn: &Fqrn,
        include_children: bool,
    ) -> Vec<SharedResource> {
        let path = module_fqrn.addressed_module();
        self.find_contained(&path, include_children)
    }

    /// All resources whose module path is `path` (or nested under it)
    pub fn find_contained(&self, path: &str, include_children: bool) -> Vec<SharedResource> {
        let child_prefix = format!("{path}.");
        self.resources
            .iter()
            .filter(|r| {
                let r = read(r);
                let module = &r.meta().module;
                *module == path || (include_children && module.starts_with(&child_prefix))
            })
            .cloned()
            .collect()
    }

    /// Iterate resources in append order
    pub fn iter(&self) -> impl Iterator<Item = &SharedResource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Prefixes of a dotted module path, longest first, ending with ""
fn module_prefixes(module: &str) -> Vec<String> {
    let parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
    let mut prefixes = Vec::with_capacity(parts.len() + 1);
    for len in (1..=parts.len()).rev() {
        prefixes.push(parts[..len].join("."));
    }
    prefixes.push(String::new());
    prefixes
}
